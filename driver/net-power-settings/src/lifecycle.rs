/// Where a [`NetPowerSettings`] is in its lifetime.
///
/// [`NetPowerSettings`]: crate::NetPowerSettings
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ObjectPhase {
    /// Created, but the adapter hasn't finished initializing yet
    #[default]
    Constructing,
    /// The adapter finished initializing
    Ready,
    /// Being torn down
    Destroying,
}

impl ObjectPhase {
    /// Whether the driver's cleanup and destroy callbacks may run.
    ///
    /// An object that never became ready was never handed to the driver, so
    /// the driver doesn't get to see its teardown either.
    pub fn runs_object_callbacks(self) -> bool {
        self == ObjectPhase::Ready
    }
}
