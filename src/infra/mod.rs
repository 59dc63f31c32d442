// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   storage.rs        — Atomic file writes
//                       Every artifact goes through a write to a
//                       .partial file, fsync, then rename.
//
//   checkpoint.rs     — Best-checkpoint persistence
//                       Weight bytes plus a best_checkpoint.json
//                       pointer. Also saves/loads TrainConfig as
//                       JSON so evaluation can rebuild the model.
//
//   artifact_store.rs — Preprocessing artifacts
//                       Feature normalizer (scaler.json) and label
//                       encoder (label_encoder.json).
//
//   metrics.rs        — Training metrics logging
//                       Writes epoch-level metrics to a CSV file
//                       for later analysis and plotting.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Atomic write helper shared by every persisted file
pub mod storage;

/// Best model checkpoint saving and loading
pub mod checkpoint;

/// Normalizer and label encoder persistence
pub mod artifact_store;

/// Training metrics CSV logger
pub mod metrics;
