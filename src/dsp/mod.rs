//! # DSP (Digital Signal Processing) Core
//!
//! The building blocks of the delay, from the bottom up:
//!
//! - **`delay_line`**: two ring buffers (left/right) sharing one write
//!   head. Stores the recent past of the signal.
//!
//! - **`read_head`**: turns a fractional delay into two buffer indices and
//!   a blend factor, and linearly interpolates between them.
//!
//! - **`smoother`**: a one-pole smoother that makes delay time changes
//!   glide instead of click.
//!
//! - **`processor`**: the per-sample loop combining all of the above with
//!   feedback and the dry/wet mix.

pub mod delay_line;
pub mod processor;
pub mod read_head;
pub mod smoother;
