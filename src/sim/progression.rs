//! Level-transition state machine
//!
//! Clearing a level does not increment it immediately: a short, time-boxed
//! transition runs first. The fade phases only matter to the renderer, but the
//! gating is core - while a transition runs, no damage or money event may
//! occur.

use rand::Rng;

use super::state::{Behavior, GameState};
use crate::consts::*;

pub const TRANSITION_TOTAL: f32 = TRANSITION_FADE_OUT + TRANSITION_HOLD + TRANSITION_FADE_IN;

/// Gameplay phase of the current level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Playing,
    /// Between levels; `elapsed` runs from 0 to [`TRANSITION_TOTAL`]
    Transitioning { elapsed: f32 },
}

/// Presentation-facing sub-phase of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    FadeOut,
    Hold,
    FadeIn,
}

/// Snapshot of transition progress for the query surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSnapshot {
    pub active: bool,
    pub elapsed: f32,
    pub total: f32,
    pub phase: Option<TransitionPhase>,
}

pub fn transition_phase(elapsed: f32) -> TransitionPhase {
    if elapsed < TRANSITION_FADE_OUT {
        TransitionPhase::FadeOut
    } else if elapsed < TRANSITION_FADE_OUT + TRANSITION_HOLD {
        TransitionPhase::Hold
    } else {
        TransitionPhase::FadeIn
    }
}

pub fn snapshot(phase: &Phase) -> TransitionSnapshot {
    match *phase {
        Phase::Playing => TransitionSnapshot {
            active: false,
            elapsed: 0.0,
            total: TRANSITION_TOTAL,
            phase: None,
        },
        Phase::Transitioning { elapsed } => TransitionSnapshot {
            active: true,
            elapsed,
            total: TRANSITION_TOTAL,
            phase: Some(transition_phase(elapsed)),
        },
    }
}

/// Arm a level transition. No-op if one is already running.
pub fn begin_transition(state: &mut GameState) {
    if matches!(state.phase, Phase::Playing) {
        state.phase = Phase::Transitioning { elapsed: 0.0 };
    }
}

/// Advance a running transition; finalizes once the time box elapses.
pub fn advance_transition(state: &mut GameState, dt: f32, rng: &mut impl Rng) {
    if let Phase::Transitioning { elapsed } = &mut state.phase {
        *elapsed += dt;
        if *elapsed >= TRANSITION_TOTAL {
            finalize(state, rng);
        }
    }
}

/// Finalize: next level, fresh arena, scatter children discarded, surviving
/// balls repositioned to the spawn point with current upgrade multipliers
/// re-applied and their behavior flags reset.
fn finalize(state: &mut GameState, rng: &mut impl Rng) {
    state.level += 1;
    state.arena.generate_level(state.level);
    state.balls.retain(|b| !b.behavior.is_child());
    for i in 0..state.balls.len() {
        let kind = state.balls[i].kind;
        let pos = state.spawn_point(rng);
        let vel = state.spawn_velocity(kind, rng);
        let damage = state.ball_damage(kind);
        let ball = &mut state.balls[i];
        ball.pos = pos;
        ball.vel = vel;
        ball.damage = damage;
        // resets sniper retarget flags and scatter split counters
        ball.behavior = Behavior::for_kind(kind);
    }
    state.phase = Phase::Playing;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::catalog::BallKind;
    use crate::sim::state::Ball;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_transition_finalizes_after_time_box() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut state = GameState::new();
        begin_transition(&mut state);
        assert!(matches!(state.phase, Phase::Transitioning { .. }));

        advance_transition(&mut state, TRANSITION_TOTAL / 2.0, &mut rng);
        assert!(matches!(state.phase, Phase::Transitioning { .. }));
        assert_eq!(state.level, 1);

        advance_transition(&mut state, TRANSITION_TOTAL, &mut rng);
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.level, 2);
        assert!(state.arena.bricks.iter().all(|b| b.value == 10));
    }

    #[test]
    fn test_finalize_strips_children_and_resets_flags() {
        let mut rng = Pcg32::seed_from_u64(12);
        let mut state = GameState::new();
        let pos = state.spawn_point(&mut rng);
        state.spawn_ball(BallKind::Sniper, pos, &mut rng);
        state.spawn_ball(BallKind::Scatter, pos, &mut rng);

        // simulate mid-flight flag state and a live child
        state.balls[0].behavior = Behavior::Sniper {
            can_retarget: false,
            hit_brick_since_wall: true,
        };
        state.balls[1].behavior = Behavior::Scatter {
            last_split_at: 3.0,
            children_spawned: 7,
        };
        state.balls.push(Ball {
            pos,
            vel: Vec2::new(10.0, 10.0),
            radius: 4.0,
            kind: BallKind::Scatter,
            damage: 1,
            behavior: Behavior::ScatterChild,
        });

        begin_transition(&mut state);
        advance_transition(&mut state, TRANSITION_TOTAL, &mut rng);

        assert_eq!(state.balls.len(), 2);
        assert!(matches!(
            state.balls[0].behavior,
            Behavior::Sniper {
                can_retarget: true,
                hit_brick_since_wall: false
            }
        ));
        assert!(matches!(
            state.balls[1].behavior,
            Behavior::Scatter {
                children_spawned: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_phase_boundaries() {
        assert_eq!(transition_phase(0.0), TransitionPhase::FadeOut);
        assert_eq!(
            transition_phase(TRANSITION_FADE_OUT + 0.01),
            TransitionPhase::Hold
        );
        assert_eq!(
            transition_phase(TRANSITION_FADE_OUT + TRANSITION_HOLD + 0.01),
            TransitionPhase::FadeIn
        );
    }

    #[test]
    fn test_begin_is_idempotent_while_running() {
        let mut state = GameState::new();
        begin_transition(&mut state);
        if let Phase::Transitioning { elapsed } = &mut state.phase {
            *elapsed = 0.3;
        }
        begin_transition(&mut state);
        assert_eq!(state.phase, Phase::Transitioning { elapsed: 0.3 });
    }
}
