// THEORY:
// The `Ball` module holds the "dumb" data containers of the game: the colored
// target itself, its position on screen, and the fixed size of the frame it
// lives in. Like every leaf module, it knows nothing about motion, scoring or
// time. The only logic here is geometric: what radius fits a frame, and where a
// ball of that radius may be centered without leaving it.
//
// Key architectural principles:
// 1.  **Closed color set**: `BallColor` is a three-valued enum. Sampling one is
//     done through rand's `Standard` distribution, so every random color in the
//     crate goes through the same uniform draw.
// 2.  **Bounds by construction**: `FrameSize::random_center` derives its ranges
//     from the frame and the radius, so a spawned ball can never be out of
//     bounds. `FrameSize::fit_radius` clamps radii that could not fit at all.

pub mod ball {
    use rand::Rng;
    use rand::distributions::{Distribution, Standard};

    /// One of the three target colors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum BallColor {
        Red,
        Green,
        Blue,
    }

    impl BallColor {
        pub const ALL: [BallColor; 3] = [BallColor::Red, BallColor::Green, BallColor::Blue];

        /// Stable index of the color, used for per-color tables.
        pub fn index(self) -> usize {
            match self {
                BallColor::Red => 0,
                BallColor::Green => 1,
                BallColor::Blue => 2,
            }
        }

        /// The name shown on the HUD.
        pub fn name(self) -> &'static str {
            match self {
                BallColor::Red => "RED",
                BallColor::Green => "GREEN",
                BallColor::Blue => "BLUE",
            }
        }
    }

    impl Distribution<BallColor> for Standard {
        fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BallColor {
            BallColor::ALL[rng.gen_range(0..BallColor::ALL.len())]
        }
    }

    /// An integer pixel coordinate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Point {
        pub x: u32,
        pub y: u32,
    }

    impl Point {
        pub fn new(x: u32, y: u32) -> Self {
            Self { x, y }
        }
    }

    /// A single on-screen target.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Ball {
        /// The center of the ball in frame pixels.
        pub position: Point,
        /// The radius in pixels. The full circle always lies inside the frame.
        pub radius: u32,
        /// The color the player has to match.
        pub color: BallColor,
    }

    impl Ball {
        pub fn new(position: Point, radius: u32, color: BallColor) -> Self {
            Self {
                position,
                radius,
                color,
            }
        }
    }

    /// The fixed dimensions of every frame in a session.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameSize {
        pub width: u32,
        pub height: u32,
    }

    impl FrameSize {
        pub fn new(width: u32, height: u32) -> Self {
            Self { width, height }
        }

        /// The largest radius whose circle still fits inside the frame.
        pub fn max_radius(&self) -> u32 {
            self.width.min(self.height) / 2
        }

        /// Clamps `radius` so that the ball fits inside the frame.
        pub fn fit_radius(&self, radius: u32) -> u32 {
            radius.min(self.max_radius())
        }

        /// Samples a center such that `radius <= x <= width - radius` and
        /// `radius <= y <= height - radius`. `radius` must already be fitted.
        pub fn random_center<R: Rng + ?Sized>(&self, radius: u32, rng: &mut R) -> Point {
            Point::new(
                Self::random_axis(self.width, radius, rng),
                Self::random_axis(self.height, radius, rng),
            )
        }

        fn random_axis<R: Rng + ?Sized>(extent: u32, radius: u32, rng: &mut R) -> u32 {
            let span = extent.saturating_sub(2 * radius);
            if span == 0 {
                radius
            } else {
                rng.gen_range(radius..radius + span)
            }
        }
    }
}
