// THEORY:
// This file is the main entry point for the `motion_catch` library crate.
// It exposes the `GameController` (one tick per camera frame) and the `Session`
// loop that drives it from injected collaborators: a frame source, a renderer,
// an audio sink and an exit signal. The game rules themselves live in
// `core_modules`, each layer owning exactly one piece of state:
//
//   frame -> MotionDetector -> MotionMask -> HitJudge -> ScoreEngine / BallField
//                                                    -> RoundClock -> RenderIntent
//
// Nothing in here touches a camera, a window or a speaker. Those are the
// runner's job (see the `webcam_player` package), which keeps the whole game
// testable headlessly.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod game;
pub mod session;
