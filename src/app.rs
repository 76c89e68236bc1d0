//! Event dispatch runtime.
//!
//! An [`App`] owns the live layout and a shared table of callbacks keyed by
//! the `(component, property)` inputs that trigger them. One event is
//! dispatched at a time: the triggering property is recorded on the layout,
//! the matching callback runs, and its output is written back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::component::{Component, ComponentId};
use crate::error::{Error, Result};

pub type Handler = Arc<dyn Fn(&CallbackArgs) -> Result<Output> + Send + Sync>;

/// Which components a dependency refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdSelector {
    Exact(ComponentId),
    /// Any pattern id with this `type`. Outputs and states resolve to the
    /// triggering component's index.
    Match { kind: String },
}

impl IdSelector {
    fn resolve(&self, trigger: &ComponentId) -> Result<ComponentId> {
        match self {
            Self::Exact(id) => Ok(id.clone()),
            Self::Match { kind } => trigger
                .index()
                .map(|index| ComponentId::pattern(kind.clone(), index))
                .ok_or_else(|| Error::ComponentNotFound(format!("{}[MATCH]", kind))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub id: IdSelector,
    pub property: String,
}

impl Dependency {
    pub fn exact(id: ComponentId, property: &str) -> Self {
        Self {
            id: IdSelector::Exact(id),
            property: property.to_string(),
        }
    }

    pub fn matching(kind: impl Into<String>, property: &str) -> Self {
        Self {
            id: IdSelector::Match { kind: kind.into() },
            property: property.to_string(),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            IdSelector::Exact(id) => write!(f, "{}.{}", id, self.property),
            IdSelector::Match { kind } => write!(f, "{}[MATCH].{}", kind, self.property),
        }
    }
}

/// Values handed to a handler, in the order the callback declared them.
#[derive(Debug, Clone)]
pub struct CallbackArgs {
    pub trigger: ComponentId,
    pub inputs: Vec<Value>,
    pub states: Vec<Value>,
}

impl CallbackArgs {
    pub fn input(&self, i: usize) -> &Value {
        self.inputs.get(i).unwrap_or(&Value::Null)
    }

    pub fn state(&self, i: usize) -> &Value {
        self.states.get(i).unwrap_or(&Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    Clear,
    Extend(Vec<Component>),
    Append(Component),
}

/// What a handler asks the app to do with its output property.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    NoUpdate,
    Value(Value),
    Children(Vec<Component>),
    /// Edit the existing children in place instead of replacing them.
    Patch(Vec<PatchOp>),
}

pub struct Callback {
    pub name: String,
    pub output: Dependency,
    pub inputs: Vec<Dependency>,
    pub states: Vec<Dependency>,
    pub handler: Handler,
}

impl Callback {
    pub fn new<F>(name: impl Into<String>, output: Dependency, handler: F) -> Self
    where
        F: Fn(&CallbackArgs) -> Result<Output> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            output,
            inputs: Vec::new(),
            states: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn input(mut self, dependency: Dependency) -> Self {
        self.inputs.push(dependency);
        self
    }

    pub fn state(mut self, dependency: Dependency) -> Self {
        self.states.push(dependency);
        self
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("name", &self.name)
            .field("output", &self.output)
            .field("inputs", &self.inputs)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

/// A user action delivered to the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: ComponentId,
    pub property: String,
    #[serde(default)]
    pub value: Value,
}

/// A property the app changed while handling an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub id: ComponentId,
    pub property: String,
    pub value: Value,
}

/// Shared handle on an app's callback table.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    table: Arc<Mutex<HashMap<Dependency, Arc<Callback>>>>,
}

impl Dispatcher {
    /// Add a callback under each of its inputs. Nothing is inserted if any
    /// input is already taken.
    pub fn insert(&self, callback: Callback) -> Result<()> {
        let mut table = self.lock();
        if let Some(taken) = callback.inputs.iter().find(|dep| table.contains_key(*dep)) {
            return Err(Error::DuplicateCallback(taken.to_string()));
        }
        let callback = Arc::new(callback);
        for dep in &callback.inputs {
            table.insert(dep.clone(), Arc::clone(&callback));
        }
        Ok(())
    }

    /// Exact id first, then the pattern `type` of the id.
    pub fn lookup(&self, id: &ComponentId, property: &str) -> Option<Arc<Callback>> {
        let table = self.lock();
        let exact = Dependency::exact(id.clone(), property);
        if let Some(callback) = table.get(&exact) {
            return Some(Arc::clone(callback));
        }
        let kind = id.kind()?;
        table
            .get(&Dependency::matching(kind, property))
            .map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, dependency: &Dependency) -> bool {
        self.lock().contains_key(dependency)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Dependency, Arc<Callback>>> {
        // The table is only ever mutated by whole inserts, a poisoned guard is still consistent
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct App {
    layout: Component,
    dispatcher: Dispatcher,
}

impl App {
    pub fn new(layout: Component) -> Self {
        Self {
            layout,
            dispatcher: Dispatcher::default(),
        }
    }

    pub fn layout(&self) -> &Component {
        &self.layout
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    pub fn component(&self, id: &ComponentId) -> Result<&Component> {
        self.layout
            .find(id)
            .ok_or_else(|| Error::ComponentNotFound(id.to_string()))
    }

    fn component_mut(&mut self, id: &ComponentId) -> Result<&mut Component> {
        self.layout
            .find_mut(id)
            .ok_or_else(|| Error::ComponentNotFound(id.to_string()))
    }

    /// Record the event on the layout and run the callback it triggers.
    ///
    /// Only user-input properties can be set by an event; layout and data
    /// change through callback outputs alone.
    pub fn dispatch(&mut self, event: &Event) -> Result<Vec<Change>> {
        self.component_mut(&event.id)?
            .set_input_prop(&event.property, event.value.clone())?;

        let Some(callback) = self.dispatcher.lookup(&event.id, &event.property) else {
            return Ok(Vec::new());
        };

        let args = CallbackArgs {
            trigger: event.id.clone(),
            inputs: self.collect(&callback.inputs, &event.id)?,
            states: self.collect(&callback.states, &event.id)?,
        };
        // The table lock is not held here, handlers may register callbacks
        let output = (callback.handler)(&args)?;

        let target = callback.output.id.resolve(&event.id)?;
        Ok(self
            .apply(&target, &callback.output.property, output)?
            .into_iter()
            .collect())
    }

    /// Count one click on a button and dispatch it.
    pub fn click(&mut self, id: &ComponentId) -> Result<Vec<Change>> {
        let event = self.click_event(id)?;
        self.dispatch(&event)
    }

    /// The event a click on button `id` produces: its `n_clicks` plus one.
    pub fn click_event(&self, id: &ComponentId) -> Result<Event> {
        let clicks = self.component(id)?.prop("n_clicks")?.as_u64().unwrap_or(0);
        Ok(Event {
            id: id.clone(),
            property: "n_clicks".to_string(),
            value: Value::from(clicks.saturating_add(1)),
        })
    }

    /// Write `output` to `id.property`, returning the change if there was one.
    pub fn apply(
        &mut self,
        id: &ComponentId,
        property: &str,
        output: Output,
    ) -> Result<Option<Change>> {
        let component = self.component_mut(id)?;
        let value = match output {
            Output::NoUpdate => return Ok(None),
            Output::Value(value) => {
                component.set_prop(property, value.clone())?;
                value
            }
            Output::Children(children) => {
                let value = serde_json::to_value(children)?;
                component.set_prop(property, value.clone())?;
                value
            }
            Output::Patch(ops) => {
                let children = match (property, component.children_mut()) {
                    ("children", Some(children)) => children,
                    _ => {
                        return Err(Error::UnknownProperty {
                            id: id.to_string(),
                            property: property.to_string(),
                        })
                    }
                };
                for op in ops {
                    match op {
                        PatchOp::Clear => children.clear(),
                        PatchOp::Extend(more) => children.extend(more),
                        PatchOp::Append(one) => children.push(one),
                    }
                }
                component.prop(property)?
            }
        };

        Ok(Some(Change {
            id: id.clone(),
            property: property.to_string(),
            value,
        }))
    }

    fn collect(&self, deps: &[Dependency], trigger: &ComponentId) -> Result<Vec<Value>> {
        deps.iter()
            .map(|dep| {
                let id = dep.id.resolve(trigger)?;
                self.component(&id)?.prop(&dep.property)
            })
            .collect()
    }
}
