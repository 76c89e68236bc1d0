use crate::callback_manager::Registrar;
use crate::component::Component;
use crate::error::Result;

/// A self-contained piece of UI that can also wire up its own callbacks.
pub trait Figure: Send + Sync {
    /// Produce the component tree for this figure. Must not have side effects.
    fn build(&self) -> Result<Component>;

    /// Register the figure's callbacks. May register none.
    fn register_callback(&self, manager: &mut dyn Registrar) -> Result<()>;
}
