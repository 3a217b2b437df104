//! Interactive binding capture
//!
//! A capture session watches every directional input of every connected
//! controller and commits the first one that is clearly pressed and then
//! released. Each candidate keeps a small counter whose low bit mirrors the
//! last seen digital value; flips before confirmation add 3, which both flips
//! the bit and pushes the counter past the confirmation threshold. A confirmed
//! candidate that reads released commits. Values that were already held when
//! the session started need a full release, press, release cycle.

use hashbrown::HashMap;

use super::action::BindAction;
use super::binding::{BallAxis, BindingSource, PhysicalInput, Sign};
use super::controller::{ControllerHost, ControllerId, HatDirection, InputKind, PhysicalController};

/// Counters at or above this have seen a confirmed change.
const CONFIRMED: u8 = 2;

const AXIS_DIRECTIONS: [Sign; 2] = [Sign::Negative, Sign::Positive];
const HAT_DIRECTIONS: [HatDirection; 4] = [
    HatDirection::UP,
    HatDirection::RIGHT,
    HatDirection::DOWN,
    HatDirection::LEFT,
];
const BALL_DIRECTIONS: [(BallAxis, Sign); 4] = [
    (BallAxis::Y, Sign::Negative),
    (BallAxis::X, Sign::Negative),
    (BallAxis::X, Sign::Positive),
    (BallAxis::Y, Sign::Positive),
];

/// Result of one capture poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStep {
    /// Nothing decisive yet; keep polling.
    Pending,
    /// An input was pressed and released.
    Detected(BindingSource),
    /// The cancel input was held.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Candidate {
    controller: ControllerId,
    input: PhysicalInput,
}

/// Every directional input of a controller in canonical order:
/// kinds axis, hat, ball, button; indices and directions descending.
pub fn candidates(controller: &PhysicalController) -> impl Iterator<Item = PhysicalInput> + '_ {
    InputKind::ALL.into_iter().flat_map(move |kind| {
        let count = controller.count(kind).min(u16::MAX as usize) as u16;
        (0..count).rev().flat_map(move |index| {
            let inputs: Vec<PhysicalInput> = match kind {
                InputKind::Axis => AXIS_DIRECTIONS
                    .iter()
                    .rev()
                    .map(|&sign| PhysicalInput::Axis { index, sign })
                    .collect(),
                InputKind::Hat => HAT_DIRECTIONS
                    .iter()
                    .rev()
                    .map(|&direction| PhysicalInput::Hat { index, direction })
                    .collect(),
                InputKind::Ball => BALL_DIRECTIONS
                    .iter()
                    .rev()
                    .map(|&(axis, sign)| PhysicalInput::Ball { index, axis, sign })
                    .collect(),
                InputKind::Button => vec![PhysicalInput::Button { index }],
            };
            inputs
        })
    })
}

/// An armed capture for one (port, action) slot.
#[derive(Debug)]
pub struct CaptureSession {
    port: usize,
    action: BindAction,
    counters: HashMap<Candidate, u8>,
}

impl CaptureSession {
    pub fn new(port: usize, action: BindAction) -> Self {
        Self {
            port,
            action,
            counters: HashMap::new(),
        }
    }

    /// The slot this session will write.
    pub fn target(&self) -> (usize, BindAction) {
        (self.port, self.action)
    }

    /// Poll every candidate once.
    ///
    /// Controllers that disappeared simply stop contributing; with no
    /// controllers at all the session stays pending until cancelled.
    pub fn step<H: ControllerHost + ?Sized>(&mut self, host: &H, cancel_held: bool) -> CaptureStep {
        if cancel_held {
            return CaptureStep::Cancelled;
        }

        for controller in host.controllers() {
            let Some(state) = host.state(controller.id) else {
                continue;
            };
            for input in candidates(controller) {
                let v = input.evaluate(state, false) as u8;
                let candidate = Candidate {
                    controller: controller.id,
                    input,
                };
                let w = self.counters.entry(candidate).or_insert(v);
                if v == *w & 1 {
                    continue;
                }
                if *w < CONFIRMED || v != 0 {
                    *w = w.wrapping_add(3);
                } else {
                    return CaptureStep::Detected(BindingSource::bound(controller.id, input));
                }
            }
        }
        CaptureStep::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockControllerHost;

    fn pad_host() -> MockControllerHost {
        let mut host = MockControllerHost::new();
        host.connect(ControllerId(1), "Test Pad", 2, 1, 0, 4);
        host
    }

    #[test]
    fn test_candidate_order() {
        let pad = PhysicalController {
            id: ControllerId(1),
            name: "Pad".to_string(),
            axes: 2,
            hats: 1,
            balls: 1,
            buttons: 2,
        };
        let all: Vec<_> = candidates(&pad).collect();
        assert_eq!(all.len(), 2 * 2 + 4 + 4 + 2);
        assert_eq!(
            all[0],
            PhysicalInput::Axis {
                index: 1,
                sign: Sign::Positive
            }
        );
        assert_eq!(
            all[4],
            PhysicalInput::Hat {
                index: 0,
                direction: HatDirection::LEFT
            }
        );
        assert_eq!(
            all[8],
            PhysicalInput::Ball {
                index: 0,
                axis: BallAxis::Y,
                sign: Sign::Positive
            }
        );
        assert_eq!(*all.last().unwrap(), PhysicalInput::Button { index: 0 });
    }

    #[test]
    fn test_commits_after_press_then_release() {
        let mut host = pad_host();
        let mut session = CaptureSession::new(0, BindAction::A);

        assert_eq!(session.step(&host, false), CaptureStep::Pending);

        host.state_mut(ControllerId(1)).buttons[2] = true;
        assert_eq!(session.step(&host, false), CaptureStep::Pending);

        host.state_mut(ControllerId(1)).buttons[2] = false;
        assert_eq!(
            session.step(&host, false),
            CaptureStep::Detected(BindingSource::bound(
                ControllerId(1),
                PhysicalInput::Button { index: 2 }
            ))
        );
    }

    #[test]
    fn test_press_alone_does_not_commit() {
        let mut host = pad_host();
        let mut session = CaptureSession::new(0, BindAction::A);
        session.step(&host, false);

        host.state_mut(ControllerId(1)).axes[0] = 30000;
        for _ in 0..5 {
            assert_eq!(session.step(&host, false), CaptureStep::Pending);
        }
    }

    #[test]
    fn test_held_at_start_needs_full_cycle() {
        let mut host = pad_host();
        host.state_mut(ControllerId(1)).hats[0] = HatDirection::UP;
        let mut session = CaptureSession::new(1, BindAction::Up);
        assert_eq!(session.step(&host, false), CaptureStep::Pending);

        // release
        host.state_mut(ControllerId(1)).hats[0] = HatDirection::empty();
        assert_eq!(session.step(&host, false), CaptureStep::Pending);
        // press
        host.state_mut(ControllerId(1)).hats[0] = HatDirection::UP;
        assert_eq!(session.step(&host, false), CaptureStep::Pending);
        // release commits
        host.state_mut(ControllerId(1)).hats[0] = HatDirection::empty();
        assert_eq!(
            session.step(&host, false),
            CaptureStep::Detected(BindingSource::bound(
                ControllerId(1),
                PhysicalInput::Hat {
                    index: 0,
                    direction: HatDirection::UP
                }
            ))
        );
    }

    #[test]
    fn test_axis_noise_below_threshold_ignored() {
        let mut host = pad_host();
        let mut session = CaptureSession::new(0, BindAction::LStickLeft);
        session.step(&host, false);
        for v in [3000, -4000, 11000, -11999, 0] {
            host.state_mut(ControllerId(1)).axes[1] = v;
            assert_eq!(session.step(&host, false), CaptureStep::Pending);
        }
    }

    #[test]
    fn test_cancel() {
        let host = pad_host();
        let mut session = CaptureSession::new(0, BindAction::A);
        assert_eq!(session.step(&host, true), CaptureStep::Cancelled);
    }

    #[test]
    fn test_disconnect_mid_capture() {
        let mut host = pad_host();
        let mut session = CaptureSession::new(0, BindAction::A);
        session.step(&host, false);
        host.state_mut(ControllerId(1)).buttons[0] = true;
        session.step(&host, false);

        host.disconnect(ControllerId(1));
        assert_eq!(session.step(&host, false), CaptureStep::Pending);
        assert_eq!(session.step(&host, false), CaptureStep::Pending);
    }

    #[test]
    fn test_no_controllers_stays_pending() {
        let host = MockControllerHost::new();
        let mut session = CaptureSession::new(0, BindAction::Start);
        for _ in 0..3 {
            assert_eq!(session.step(&host, false), CaptureStep::Pending);
        }
    }
}
