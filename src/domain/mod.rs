// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define what the
// system works with: raw tables, encoded samples, the error
// taxonomy, and the abstractions the other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Keeping this layer free of the tensor engine means the
// training controller and evaluator can be driven by scripted
// models in unit tests, with no backend at all.

// Raw tables read from disk and encoded training samples
pub mod sample;

// The error taxonomy shared by every layer
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
