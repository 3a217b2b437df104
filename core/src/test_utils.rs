//! Shared test utilities for unit tests

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::audio::{CHANNELS, Clock, SampleSource};
use crate::input::{ControllerHost, ControllerId, ControllerState, PhysicalController};
use crate::save::Engine;

// ============================================================================
// Controller host
// ============================================================================

/// In-memory controller host. Tests flip inputs through `state_mut`.
#[derive(Debug, Default)]
pub struct MockControllerHost {
    controllers: Vec<PhysicalController>,
    states: HashMap<ControllerId, ControllerState>,
}

impl MockControllerHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(
        &mut self,
        id: ControllerId,
        name: &str,
        axes: usize,
        hats: usize,
        balls: usize,
        buttons: usize,
    ) {
        let controller = PhysicalController {
            id,
            name: name.to_string(),
            axes,
            hats,
            balls,
            buttons,
        };
        self.states
            .insert(id, ControllerState::for_controller(&controller));
        self.controllers.retain(|c| c.id != id);
        self.controllers.push(controller);
    }

    pub fn disconnect(&mut self, id: ControllerId) {
        self.controllers.retain(|c| c.id != id);
        self.states.remove(&id);
    }

    /// Panics if the controller is not connected.
    pub fn state_mut(&mut self, id: ControllerId) -> &mut ControllerState {
        self.states
            .get_mut(&id)
            .unwrap_or_else(|| panic!("controller {id:?} not connected"))
    }
}

impl ControllerHost for MockControllerHost {
    fn controllers(&self) -> &[PhysicalController] {
        &self.controllers
    }

    fn state(&self, id: ControllerId) -> Option<&ControllerState> {
        self.states.get(&id)
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Engine whose whole state is a byte vector.
#[derive(Debug, Clone)]
pub struct MockEngine {
    pub state: Vec<u8>,
    /// Last payload handed to `deserialize`
    pub loaded: Option<Vec<u8>>,
    /// Whether `deserialize` accepts its input
    pub accept: bool,
    pub fail_serialize: bool,
}

impl MockEngine {
    pub fn new(state: Vec<u8>) -> Self {
        Self {
            state,
            loaded: None,
            accept: true,
            fail_serialize: false,
        }
    }
}

impl Engine for MockEngine {
    fn serialize_size(&self) -> usize {
        self.state.len()
    }

    fn serialize(&mut self, dst: &mut [u8]) -> bool {
        if self.fail_serialize || dst.len() != self.state.len() {
            return false;
        }
        dst.copy_from_slice(&self.state);
        true
    }

    fn deserialize(&mut self, src: &[u8]) -> bool {
        self.loaded = Some(src.to_vec());
        self.accept
    }
}

// ============================================================================
// Audio
// ============================================================================

/// Queue of stereo frames; frame `k` of a ramp holds `(k, k)`.
#[derive(Debug, Default)]
pub struct MockSampleSource {
    frames: VecDeque<[i16; CHANNELS]>,
    next: i16,
}

impl MockSampleSource {
    pub fn ramp(frames: usize) -> Self {
        let mut source = Self::default();
        source.extend(frames);
        source
    }

    /// Append `frames` more ramp frames.
    pub fn extend(&mut self, frames: usize) {
        for _ in 0..frames {
            self.frames.push_back([self.next; CHANNELS]);
            self.next = self.next.wrapping_add(1);
        }
    }
}

impl SampleSource for MockSampleSource {
    fn available_frames(&self) -> usize {
        self.frames.len()
    }

    fn pull(&mut self, dst: &mut [i16]) {
        for frame in dst.chunks_exact_mut(CHANNELS) {
            let src = self.frames.pop_front().unwrap_or([0; CHANNELS]);
            frame.copy_from_slice(&src);
        }
    }
}

/// Clock that advances 1 ms each time the mixer pauses.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.get()
    }

    fn pause(&self) {
        self.now.set(self.now.get() + 1);
    }
}
