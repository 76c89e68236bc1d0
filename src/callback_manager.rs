use std::collections::HashSet;

use crate::app::{App, Callback, Dependency, Dispatcher};
use crate::error::{Error, Result};

/// Anything figures can register callbacks with.
pub trait Registrar {
    fn register(&mut self, callback: Callback) -> Result<()>;
}

/// A registrar that can be instantiated by a [`Context`](crate::context::Context)
/// and bound to an app once.
pub trait CallbackRegistry: Registrar + Default + Send + 'static {
    /// Attach every registered callback to `app`. Only the first call succeeds.
    fn bind_all(&mut self, app: &App) -> Result<usize>;

    fn is_bound(&self) -> bool;
}

/// Collects callbacks from figures and hands them to the app's dispatcher.
///
/// Before [`bind_all`](CallbackRegistry::bind_all) registrations are queued;
/// afterwards they go straight to the bound dispatcher, which is how tables
/// created at runtime get their callbacks.
#[derive(Default)]
pub struct CallbackManager {
    keys: HashSet<Dependency>,
    pending: Vec<Callback>,
    bound: Option<Dispatcher>,
    registered: usize,
}

impl CallbackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks accepted so far, bound or not.
    pub fn len(&self) -> usize {
        self.registered
    }

    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }

    pub fn is_registered(&self, dependency: &Dependency) -> bool {
        self.keys.contains(dependency)
    }
}

impl Registrar for CallbackManager {
    fn register(&mut self, callback: Callback) -> Result<()> {
        if callback.inputs.is_empty() {
            return Err(Error::InvalidValue {
                property: "inputs".to_string(),
                reason: format!("callback '{}' has no inputs", callback.name),
            });
        }

        let mut incoming = HashSet::new();
        for dep in &callback.inputs {
            if self.keys.contains(dep) || !incoming.insert(dep.clone()) {
                return Err(Error::DuplicateCallback(dep.to_string()));
            }
        }

        match &self.bound {
            Some(dispatcher) => dispatcher.insert(callback)?,
            None => self.pending.push(callback),
        }
        self.keys.extend(incoming);
        self.registered += 1;
        Ok(())
    }
}

impl CallbackRegistry for CallbackManager {
    fn bind_all(&mut self, app: &App) -> Result<usize> {
        if self.bound.is_some() {
            return Err(Error::AlreadyBound);
        }

        let dispatcher = app.dispatcher();
        // Nothing leaves the queue unless every input is still free in the app
        if let Some(taken) = self
            .pending
            .iter()
            .flat_map(|callback| &callback.inputs)
            .find(|dep| dispatcher.contains(dep))
        {
            return Err(Error::DuplicateCallback(taken.to_string()));
        }

        let count = self.pending.len();
        for callback in self.pending.drain(..) {
            dispatcher.insert(callback)?;
        }
        self.bound = Some(dispatcher);
        Ok(count)
    }

    fn is_bound(&self) -> bool {
        self.bound.is_some()
    }
}
