//! Per-tick ball simulation and the event reducer
//!
//! `step` advances every active ball and returns the list of events the tick
//! produced; `apply_events` folds them into the economy and progression state
//! in a defined order. Keeping detection and application apart makes the
//! money flow and the transition trigger independently testable.

use glam::Vec2;
use rand::Rng;

use super::arena::{damage_boss, damage_brick, roll_crit};
use super::progression::{self, Phase};
use super::state::{Ball, Behavior, GameState};
use crate::consts::*;

/// Events produced by one simulation step, applied in order by [`apply_events`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// Damage landed on a brick or the boss; `awarded` is the money to credit
    DamageDealt { awarded: u64, crit: bool },
    /// A brick or the boss reached zero value
    TargetDestroyed,
    /// The last target on the level died
    LevelCleared,
    /// The boss countdown expired; `award` is the consolation payout
    BossTimedOut { award: u64 },
}

/// Advance the simulation by `dt` seconds (floored to [`DT_FLOOR`], never
/// capped above). Returns the tick's events; the caller feeds them to
/// [`apply_events`].
pub fn step(state: &mut GameState, dt: f32, rng: &mut impl Rng) -> Vec<SimEvent> {
    let dt = dt.max(DT_FLOOR);
    state.time_secs += dt;
    let mut events = Vec::new();

    if matches!(state.phase, Phase::Transitioning { .. }) {
        // Damage and the boss clock are suspended; balls keep drifting.
        drift(state, dt);
        progression::advance_transition(state, dt, rng);
        return events;
    }

    let crit_stacks = state.crit_stacks();
    let now = state.time_secs;
    let mut pending_children: Vec<Ball> = Vec::new();

    let arena = &mut state.arena;
    let width = arena.width;
    let height = arena.height;

    for ball in state.balls.iter_mut() {
        // 1. Boss first: a ball touching the boss skips brick tests this tick
        let mut hit_boss = false;
        if let Some(boss) = arena.boss.as_mut().filter(|b| b.alive) {
            let delta = ball.pos - boss.pos;
            let dist = delta.length();
            if dist <= boss.radius + ball.radius {
                hit_boss = true;
                let crit = roll_crit(crit_stacks, rng);
                let awarded = damage_boss(boss, ball.damage, crit);
                if awarded > 0 {
                    events.push(SimEvent::DamageDealt { awarded, crit });
                }
                if !boss.alive {
                    events.push(SimEvent::TargetDestroyed);
                }

                // Mirror reflection across the collision normal, speed kept,
                // plus a small tangential nudge so balls don't orbit forever.
                let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::Y };
                let speed = ball.vel.length().max(1.0);
                let tangent = Vec2::new(-normal.y, normal.x);
                let dir = (reflect(ball.vel, normal).normalize_or_zero()
                    + tangent * (rng.random::<f32>() - 0.5) * 0.2)
                    .normalize_or_zero();
                ball.vel = dir * speed;
                // resolve penetration
                ball.pos = boss.pos + normal * (boss.radius + ball.radius + 0.5);
            }
        }

        // 2. Armed snipers home on the nearest alive brick at unchanged speed
        if let Behavior::Sniper {
            can_retarget: true, ..
        } = ball.behavior
        {
            let target = arena
                .bricks
                .iter()
                .filter(|b| b.alive)
                .min_by(|a, b| {
                    let da = a.center().distance_squared(ball.pos);
                    let db = b.center().distance_squared(ball.pos);
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|b| b.center());
            if let Some(target) = target {
                let speed = ball.vel.length().max(1.0);
                ball.vel = (target - ball.pos).normalize_or_zero() * speed;
            }
        }

        // 3. Integrate
        ball.pos += ball.vel * dt;

        // 4. Boundary reflection, restitution 1.0. Left/right/top are
        // "walls" for targeting purposes; the floor is not.
        let mut wall_bounce = false;
        if ball.pos.x - ball.radius < 0.0 {
            ball.pos.x = ball.radius;
            ball.vel.x = -ball.vel.x;
            wall_bounce = true;
        }
        if ball.pos.x + ball.radius > width {
            ball.pos.x = width - ball.radius;
            ball.vel.x = -ball.vel.x;
            wall_bounce = true;
        }
        if ball.pos.y - ball.radius < 0.0 {
            ball.pos.y = ball.radius;
            ball.vel.y = -ball.vel.y;
            wall_bounce = true;
        }
        if ball.pos.y + ball.radius > height {
            ball.pos.y = height - ball.radius;
            ball.vel.y = -ball.vel.y;
        }

        if wall_bounce {
            match &mut ball.behavior {
                Behavior::Sniper {
                    can_retarget,
                    hit_brick_since_wall,
                } => {
                    *can_retarget = true;
                    *hit_brick_since_wall = false;
                    // with a boss up there are no bricks to scan: go straight at it
                    if let Some(boss) = arena.boss.as_ref().filter(|b| b.alive) {
                        let speed = ball.vel.length().max(1.0);
                        ball.vel = (boss.pos - ball.pos).normalize_or_zero() * speed;
                    }
                }
                Behavior::Scatter { .. } => {
                    try_split(ball, now, rng, &mut pending_children);
                }
                _ => {}
            }
        }

        // 5. Bricks: first hit in array order wins, one hit per tick
        if !hit_boss {
            for brick in arena.bricks.iter_mut() {
                if !brick.alive || !brick.intersects_circle(ball.pos, ball.radius) {
                    continue;
                }
                // mirror the heading and jitter it, speed preserved
                let speed = ball.vel.length().max(1.0);
                let angle = -ball.vel.y.atan2(ball.vel.x)
                    + (rng.random::<f32>() - 0.5) * 2.0 * BRICK_HIT_JITTER;
                ball.vel = Vec2::new(angle.cos(), angle.sin()) * speed;

                let crit = roll_crit(crit_stacks, rng);
                let awarded = damage_brick(brick, ball.damage, crit);
                if awarded > 0 {
                    events.push(SimEvent::DamageDealt { awarded, crit });
                }
                if !brick.alive {
                    events.push(SimEvent::TargetDestroyed);
                }

                match &mut ball.behavior {
                    Behavior::Sniper {
                        can_retarget,
                        hit_brick_since_wall,
                    } => {
                        // locked until the next wall bounce
                        *can_retarget = false;
                        *hit_brick_since_wall = true;
                    }
                    Behavior::Scatter { .. } => {
                        try_split(ball, now, rng, &mut pending_children);
                    }
                    _ => {}
                }
                break;
            }
        }
    }

    state.balls.append(&mut pending_children);

    if state.arena.cleared() {
        events.push(SimEvent::LevelCleared);
    }

    // 7. Boss countdown runs outside the ball loop
    if let Some(boss) = state.arena.boss.as_mut().filter(|b| b.alive) {
        boss.timer -= dt;
        if boss.timer <= 0.0 {
            let award = (boss.max_value as f64 * BOSS_TIMEOUT_AWARD_FACTOR).floor() as u64;
            events.push(SimEvent::BossTimedOut { award });
        }
    }

    events
}

/// Fold a tick's events into the state, in order. Returns true if money
/// changed (the facade uses this to trigger a write-through save).
pub fn apply_events(state: &mut GameState, events: &[SimEvent]) -> bool {
    let mut money_changed = false;
    for event in events {
        match *event {
            SimEvent::DamageDealt { awarded, .. } => {
                state.money += awarded;
                money_changed |= awarded > 0;
            }
            SimEvent::TargetDestroyed => {}
            SimEvent::LevelCleared => progression::begin_transition(state),
            SimEvent::BossTimedOut { award } => {
                // failure path: consolation payout, then back one level
                state.money += award;
                state.level = state.level.saturating_sub(1).max(1);
                state.arena.generate_level(state.level);
                money_changed = true;
            }
        }
    }
    money_changed
}

/// Route a pointer click to the boss or the brick under the point, applying
/// `1 + click upgrade level` damage. No-op while transitioning or when the
/// point hits nothing alive.
pub fn click_at(state: &mut GameState, point: Vec2, rng: &mut impl Rng) -> Vec<SimEvent> {
    let mut events = Vec::new();
    if !matches!(state.phase, Phase::Playing) {
        return events;
    }
    let damage = state.click_damage();
    let crit_stacks = state.crit_stacks();
    let arena = &mut state.arena;

    if let Some(boss) = arena.boss.as_mut().filter(|b| b.alive) {
        if point.distance(boss.pos) <= boss.radius {
            let crit = roll_crit(crit_stacks, rng);
            let awarded = damage_boss(boss, damage, crit);
            if awarded > 0 {
                events.push(SimEvent::DamageDealt { awarded, crit });
            }
            if !boss.alive {
                events.push(SimEvent::TargetDestroyed);
            }
        }
    } else if let Some(brick) = arena
        .bricks
        .iter_mut()
        .find(|b| b.alive && b.contains_point(point))
    {
        let crit = roll_crit(crit_stacks, rng);
        let awarded = damage_brick(brick, damage, crit);
        if awarded > 0 {
            events.push(SimEvent::DamageDealt { awarded, crit });
        }
        if !brick.alive {
            events.push(SimEvent::TargetDestroyed);
        }
    }

    if arena.cleared() {
        events.push(SimEvent::LevelCleared);
    }
    events
}

/// Specular reflection of `vel` across a unit `normal`
fn reflect(vel: Vec2, normal: Vec2) -> Vec2 {
    vel - 2.0 * vel.dot(normal) * normal
}

/// Attempt a scatter split: 150ms cooldown on the sim clock, at most 10
/// children over the parent's lifetime, 2 per split.
fn try_split(parent: &mut Ball, now: f32, rng: &mut impl Rng, out: &mut Vec<Ball>) {
    let Behavior::Scatter {
        last_split_at,
        children_spawned,
    } = &mut parent.behavior
    else {
        return;
    };
    if *children_spawned >= SCATTER_MAX_CHILDREN {
        return;
    }
    if now - *last_split_at < SCATTER_SPLIT_COOLDOWN {
        return;
    }
    *last_split_at = now;

    let speed = parent.vel.length().max(1.0);
    let damage = (parent.damage / 4).max(1);
    let count = (SCATTER_MAX_CHILDREN - *children_spawned).min(2);
    for _ in 0..count {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let child_speed = speed * rng.random_range(0.6..1.2);
        out.push(Ball {
            pos: parent.pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * child_speed,
            radius: SCATTER_CHILD_RADIUS,
            kind: parent.kind,
            damage,
            behavior: Behavior::ScatterChild,
        });
        *children_spawned += 1;
    }
}

/// Transition-time movement: integrate and bounce, no targeting, no splits,
/// no damage.
fn drift(state: &mut GameState, dt: f32) {
    let width = state.arena.width;
    let height = state.arena.height;
    for ball in state.balls.iter_mut() {
        ball.pos += ball.vel * dt;
        if ball.pos.x - ball.radius < 0.0 {
            ball.pos.x = ball.radius;
            ball.vel.x = -ball.vel.x;
        }
        if ball.pos.x + ball.radius > width {
            ball.pos.x = width - ball.radius;
            ball.vel.x = -ball.vel.x;
        }
        if ball.pos.y - ball.radius < 0.0 {
            ball.pos.y = ball.radius;
            ball.vel.y = -ball.vel.y;
        }
        if ball.pos.y + ball.radius > height {
            ball.pos.y = height - ball.radius;
            ball.vel.y = -ball.vel.y;
        }
    }
}
