/// Data layer: core types, acquisition loading and mass lists.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv          masses.txt
///        │                              │
///        ▼                              ▼
///   ┌──────────┐                  ┌──────────┐
///   │  loader   │                  │  masses   │  mass[=label] → TargetMass
///   └──────────┘                  └──────────┘
///        │                              │
///        ▼                              │
///   ┌─────────────┐                     │
///   │ Acquisition  │  Vec<Spectrum>     │
///   └─────────────┘                     │
///        │                              │
///        └──────────► extract ◄─────────┘
/// ```

pub mod loader;
pub mod masses;
pub mod model;
