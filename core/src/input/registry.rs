//! Per-port binding table and its evaluation

use std::time::Instant;

use smallvec::SmallVec;

use super::action::{BindAction, PORT_COUNT};
use super::binding::{BindingSource, FULL_SCALE};
use super::controller::{ControllerHost, ControllerId, PhysicalController};
use super::templates::{ControllerTemplate, select_template};
use crate::config::{SharedSettings, SettingsStore, lock_settings};

/// Shown in place of a controller name once its controller is gone.
pub const DISCONNECTED_CONTROLLER: &str = "<Disconnected Controller>";

type PortTable = [BindingSource; BindAction::COUNT];

/// UI description of one bound slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescription {
    pub controller: String,
    pub binding: String,
}

/// Maps (port, action) slots to physical sources.
///
/// Reads happen on the poll path without locking; writes that persist go
/// through the shared settings lock.
#[derive(Debug)]
pub struct BindingRegistry {
    ports: [PortTable; PORT_COUNT],
    known: Vec<PhysicalController>,
    /// Template whose friendly names describe port 1 while it is unmodified
    template: Option<&'static ControllerTemplate>,
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self {
            ports: [[BindingSource::None; BindAction::COUNT]; PORT_COUNT],
            known: Vec::new(),
            template: None,
        }
    }

    pub fn binding(&self, port: usize, action: BindAction) -> BindingSource {
        self.ports
            .get(port)
            .map_or(BindingSource::None, |table| table[action.index()])
    }

    /// Controllers as of the last refresh.
    pub fn controllers(&self) -> &[PhysicalController] {
        &self.known
    }

    pub fn has_controllers(&self) -> bool {
        !self.known.is_empty()
    }

    /// Name of the template in effect, if any.
    pub fn active_template(&self) -> Option<&'static str> {
        self.template.map(|t| t.name)
    }

    /// Current value of a slot.
    ///
    /// Digital actions read 0 or [`FULL_SCALE`]. Analog actions read the whole
    /// stick pair as `positive - negative`, so opposite inputs cancel.
    pub fn resolve<H: ControllerHost + ?Sized>(&self, port: usize, action: BindAction, host: &H) -> i16 {
        let Some(table) = self.ports.get(port) else {
            return 0;
        };
        match action.analog_pair() {
            None => {
                if table[action.index()].value(host, false) != 0 {
                    FULL_SCALE
                } else {
                    0
                }
            }
            Some((negative, positive)) => {
                let neg = table[negative.index()].value(host, true);
                let pos = table[positive.index()].value(host, true);
                pos - neg
            }
        }
    }

    /// Reconcile with the host's controller list after a hot-plug.
    ///
    /// Bindings of removed controllers are voided, the template is re-selected
    /// and custom bindings are reloaded from the settings. Returns `false` when
    /// the controller list did not change.
    pub fn refresh_controllers<H: ControllerHost + ?Sized>(
        &mut self,
        host: &H,
        settings: &SharedSettings,
        now: Instant,
    ) -> bool {
        let current = host.controllers();
        let unchanged = current.len() == self.known.len()
            && current.iter().zip(&self.known).all(|(a, b)| a == b);
        if unchanged {
            return false;
        }

        let removed: SmallVec<[ControllerId; 4]> = self
            .known
            .iter()
            .filter(|old| !current.iter().any(|c| c.id == old.id))
            .map(|old| old.id)
            .collect();
        for old in &self.known {
            if removed.contains(&old.id) {
                tracing::info!("Controller disconnected: {}", old.name);
            }
        }
        for c in current {
            if !self.known.iter().any(|old| old.id == c.id) {
                tracing::info!(
                    "Controller connected: {} ({} axes, {} hats, {} balls, {} buttons)",
                    c.name,
                    c.axes,
                    c.hats,
                    c.balls,
                    c.buttons
                );
            }
        }
        for slot in self.ports.iter_mut().flatten() {
            if slot.controller().is_some_and(|id| removed.contains(&id)) {
                *slot = BindingSource::None;
            }
        }
        self.known = current.to_vec();

        let template = select_template(&self.known);
        let mut store = lock_settings(settings);
        let use_custom = self.load_custom_bindings(&mut store, template, now);

        match template {
            Some((template, id)) if !use_custom => {
                tracing::debug!("Applying {} template to port 1", template.name);
                self.ports[0] = template.bindings(id);
                self.template = Some(template);
            }
            _ => self.template = None,
        }
        true
    }

    /// Load `bind_port_*` entries; returns whether custom bindings stay in effect.
    fn load_custom_bindings(
        &mut self,
        store: &mut SettingsStore,
        template: Option<(&'static ControllerTemplate, ControllerId)>,
        now: Instant,
    ) -> bool {
        if !store.config().input.custom_controller_bindings {
            return false;
        }

        let mut have_primary = false;
        let mut have_secondary = false;
        for port in 0..PORT_COUNT {
            for action in BindAction::ALL {
                let Some(config) = store.config().input.bindings.get(&action.settings_key(port)) else {
                    continue;
                };
                if port == 0 {
                    have_primary = true;
                } else {
                    have_secondary = true;
                }
                self.ports[port][action.index()] = BindingSource::from_config(config, &self.known);
            }
        }

        if have_primary && !have_secondary {
            if let Some((template, id)) = template {
                if self.ports[0] == template.bindings(id) {
                    tracing::debug!("Port 1 bindings match the {} template; dropping them", template.name);
                    let bindings = &mut store.config_mut().input.bindings;
                    for action in BindAction::ALL {
                        bindings.remove(&action.settings_key(0));
                    }
                    store.mark_dirty(now);
                    have_primary = false;
                }
            }
        }

        if !have_primary {
            if !have_secondary {
                store.config_mut().input.custom_controller_bindings = false;
                store.mark_dirty(now);
            }
            return false;
        }
        true
    }

    /// Store a captured binding and persist it.
    ///
    /// Binding the value a slot already holds is a no-op and returns `false`.
    /// The first custom binding also snapshots every bound slot into the
    /// settings so the template no longer overrides them.
    pub fn commit_binding<H: ControllerHost + ?Sized>(
        &mut self,
        port: usize,
        action: BindAction,
        binding: BindingSource,
        host: &H,
        settings: &SharedSettings,
        now: Instant,
    ) -> bool {
        let Some(table) = self.ports.get_mut(port) else {
            return false;
        };
        if table[action.index()] == binding {
            return false;
        }
        table[action.index()] = binding;
        self.template = None;

        let controllers = host.controllers();
        let mut store = lock_settings(settings);
        let input = &mut store.config_mut().input;
        match binding.to_config(controllers) {
            Some(config) => {
                input.bindings.insert(action.settings_key(port), config);
            }
            None => {
                input.bindings.remove(&action.settings_key(port));
            }
        }
        if !input.custom_controller_bindings {
            input.custom_controller_bindings = true;
            for (p, table) in self.ports.iter().enumerate() {
                for action in BindAction::ALL {
                    if let Some(config) = table[action.index()].to_config(controllers) {
                        input.bindings.insert(action.settings_key(p), config);
                    }
                }
            }
        }
        store.mark_dirty(now);
        tracing::debug!("Bound port {} {} to {:?}", port + 1, action.config_name(), binding);
        true
    }

    /// Describe a slot for the UI, `None` when it is unbound.
    pub fn describe(&self, port: usize, action: BindAction) -> Option<BindingDescription> {
        let BindingSource::Bound { controller, input } = self.binding(port, action) else {
            return None;
        };
        let controller = self
            .known
            .iter()
            .find(|c| c.id == controller)
            .map_or_else(|| DISCONNECTED_CONTROLLER.to_string(), |c| c.name.clone());
        let binding = match self.template {
            Some(template) if port == 0 => template.label(action).to_string(),
            _ => input.to_string(),
        };
        Some(BindingDescription { controller, binding })
    }
}

#[cfg(test)]
mod tests;
