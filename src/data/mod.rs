// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the acoustic feature CSV
// all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   emotion.csv
//       │
//       ▼
//   CsvLoader         → reads numeric feature columns + label column
//       │
//       ▼
//   Preprocessor      → NaN/Inf → 0, z-score normalisation
//       │
//       ▼
//   LabelEncoder      → label strings → class indices 0..K-1
//       │
//       ▼
//   EmotionDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   Splitter          → stratified train / validation partitions
//       │
//       ▼
//   BatchSource       → restartable, optionally shuffled batches
//       │
//       ▼
//   EmotionBatcher    → stacks samples into tensor batches
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads the feature CSV using the csv crate
pub mod loader;

/// Sanitises non-finite values and fits/applies the feature normaliser
pub mod preprocessor;

/// Maps label strings to dense class indices
pub mod label_encoder;

/// Implements Burn's Dataset trait for encoded samples
pub mod dataset;

/// Batch iteration over a partition plus Burn's Batcher
pub mod batcher;

/// Stratified train/validation split
pub mod splitter;
