//! Embassy async tasks
//!
//! Each task runs independently. Display tasks take turns on the matrix
//! through the access broker; network traffic goes through the modem task.

pub mod blink;
pub mod broker;
pub mod clock;
pub mod lhc_status;
pub mod marquee;
pub mod menu;
pub mod modem;
pub mod weather;

pub use blink::blink_task;
pub use broker::broker_task;
pub use clock::clock_task;
pub use lhc_status::lhc_status_task;
pub use marquee::marquee_task;
pub use menu::menu_task;
pub use modem::{modem_task, ModemHttp};
pub use weather::weather_task;
