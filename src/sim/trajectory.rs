//! Thrown-ball trajectory math
//!
//! A throw is two parabola arms joined at the apex. The parameter t runs
//! from -1 (origin) through 0 (apex, horizontally halfway) to +1
//! (destination). Column -1 and column `num_columns` are the off-board
//! sentinels: a ball heading there flies out and re-enters from the other
//! edge with whatever range is left.

use glam::Vec2;

use super::ball::BallKind;

/// Where a throw ends and how much range is carried past the edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    /// -1..=num_columns, the ends being fly-out sentinels
    pub column: i32,
    /// Columns still to travel after the next fly-out (0 if landing in-bound)
    pub remaining_range: i32,
}

impl Destination {
    pub fn is_fly_out(&self, num_columns: i32) -> bool {
        self.column == -1 || self.column == num_columns
    }
}

/// Destination of a fresh throw from `origin_x`
pub fn launch_destination(origin_x: i32, range: i32, num_columns: i32) -> Destination {
    let raw = origin_x + range;
    if raw < 0 {
        Destination {
            column: -1,
            remaining_range: raw + 1,
        }
    } else if raw > num_columns {
        Destination {
            column: num_columns,
            remaining_range: raw - num_columns,
        }
    } else {
        Destination {
            column: raw,
            remaining_range: 0,
        }
    }
}

/// Destination after flying out of the left (`left == true`) or right edge
pub fn fly_out_destination(left: bool, remaining_range: i32, num_columns: i32) -> Destination {
    if left {
        if remaining_range < -num_columns {
            Destination {
                column: -1,
                remaining_range: remaining_range + num_columns,
            }
        } else {
            Destination {
                column: num_columns - 1 + remaining_range,
                remaining_range: 0,
            }
        }
    } else if remaining_range > num_columns - 1 {
        Destination {
            column: num_columns,
            remaining_range: remaining_range - num_columns,
        }
    } else {
        Destination {
            column: remaining_range,
            remaining_range: 0,
        }
    }
}

/// t-speed factor past the apex, so both arms take similar time despite different drops
pub fn speedup_pastmax(origin_y: f32, maxheight: f32, dropheight: f32) -> f32 {
    (maxheight - origin_y) / (maxheight - dropheight)
}

/// Position on the trajectory for parameter `t`
pub fn position(t: f32, origin: Vec2, destination: f32, maxheight: f32, dropheight: f32) -> Vec2 {
    let midx = (origin.x + destination) / 2.0;
    if t < 0.0 {
        Vec2::new(
            midx + t * (midx - origin.x),
            maxheight - t * t * (maxheight - origin.y),
        )
    } else {
        Vec2::new(
            midx - t * (midx - destination),
            maxheight - t * t * (maxheight - dropheight),
        )
    }
}

/// Kind a ball turns into on each fly-out: non-bomb specials become bombs,
/// everything else becomes a heart. Repeated fly-outs cycle Heart, Bomb, Heart, ...
pub fn fly_out_kind(kind: BallKind) -> BallKind {
    match kind {
        BallKind::Heart | BallKind::Cutter => BallKind::Bomb,
        BallKind::Bomb | BallKind::Colored { .. } => BallKind::Heart,
    }
}

/// Number of fly-outs a throw goes through before landing in-bound
pub fn count_fly_outs(origin_x: i32, range: i32, num_columns: i32) -> u32 {
    let mut dest = launch_destination(origin_x, range, num_columns);
    let mut fly_outs = 0;
    while dest.is_fly_out(num_columns) {
        fly_outs += 1;
        dest = fly_out_destination(dest.column == -1, dest.remaining_range, num_columns);
    }
    fly_outs
}
