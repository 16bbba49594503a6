//! DSP — the node graph behind the ambient player.
//!
//! All synthesis runs in Rust so the same output comes out of the WebAudio
//! host (AudioWorklet + WASM) and native hosts pulling blocks directly.

pub mod context;
pub mod decode;
pub mod filter;
pub mod mixer;
pub mod oscillator;
pub mod param;
pub mod renderer;
pub mod sampler;
pub mod voice;
