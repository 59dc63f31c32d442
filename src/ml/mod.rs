// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code apart
// from the Dataset/Batcher glue in Layer 4.
//
// What's in this layer:
//
//   model.rs      — Feed-forward emotion classifier
//                   Linear(D,256) → ReLU → Dropout(0.3)
//                   → Linear(256,128) → ReLU → Dropout(0.3)
//                   → Linear(128,64)  → ReLU → Dropout(0.3)
//                   → Linear(64,K)
//
//   loss.rs       — Class weights + weighted cross-entropy
//
//   scheduler.rs  — Reduce-on-plateau learning rate
//
//   learner.rs    — Model + Adam + loss behind TrainableModel
//
//   trainer.rs    — Training controller: epochs, early stopping,
//                   best-checkpoint persistence
//
//   evaluator.rs  — Accuracy and per-class report on the
//                   best checkpoint
//
//   inferencer.rs — Loads artifacts and labels new rows
//
//   device.rs     — CPU / GPU backend resolution
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Feed-forward classifier architecture
pub mod model;

/// Imbalance-aware loss
pub mod loss;

/// Plateau learning-rate scheduler
pub mod scheduler;

/// Burn implementation of TrainableModel
pub mod learner;

/// Epoch loop with early stopping and checkpointing
pub mod trainer;

/// Classification report on the best checkpoint
pub mod evaluator;

/// Inference engine — loads checkpoint and predicts labels
pub mod inferencer;

/// Compute device resolution
pub mod device;
