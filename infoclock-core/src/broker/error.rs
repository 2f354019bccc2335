/// Errors reported by the access broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BrokerError {
    /// Pending queue is at capacity; the request was not admitted.
    QueueFull,
    /// Caller does not hold the grant. Broker state is left unchanged.
    NotOwner,
    /// Caller already holds the grant and asked for it again.
    AlreadyOwner,
    /// Caller already has a request waiting in the queue.
    AlreadyPending,
    /// The task id was not handed out by this broker.
    UnknownClient,
    /// Every client slot has been registered.
    TooManyClients,
    /// The broker was shut down; no further grants will be issued.
    ShutDown,
}
