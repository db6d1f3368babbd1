pub mod ball;
pub mod ball_field;
pub mod hit_judge;
pub mod motion_detector;
pub mod round_clock;
pub mod score_engine;
pub mod utils;
