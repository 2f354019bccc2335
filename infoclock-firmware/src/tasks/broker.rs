//! Access broker task
//!
//! Runs the arbitration loop that hands the matrix to one task at a time.

use defmt::*;

use crate::display::Broker;

#[embassy_executor::task]
pub async fn broker_task(broker: &'static Broker) {
    info!("Broker task started");
    broker.run().await;
    warn!("Broker loop exited");
}
