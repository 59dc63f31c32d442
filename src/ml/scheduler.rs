// ============================================================
// Layer 5 — Plateau Learning-Rate Scheduler
// ============================================================
// Halves the learning rate when validation loss has not
// strictly improved for `patience` consecutive epochs.
//
// The counter here is independent of the early-stopping counter
// kept by the training controller: with the defaults the LR is
// reduced after 3 flat epochs while training keeps going until
// 10 flat epochs.
//
//   epoch   val_loss   bad_epochs   lr
//     1      1.00          0        1e-3
//     2      1.10          1        1e-3
//     3      1.05          2        1e-3
//     4      1.02          3 → 0    5e-4   ← reduced
//     5      0.90          0        5e-4

/// Reduce-on-plateau scheduler driven by mean validation loss.
#[derive(Debug, Clone)]
pub struct PlateauScheduler {
    factor:     f64,
    patience:   usize,
    best:       f64,
    bad_epochs: usize,
}

impl PlateauScheduler {
    pub fn new(factor: f64, patience: usize) -> Self {
        Self { factor, patience, best: f64::INFINITY, bad_epochs: 0 }
    }

    /// Feed one epoch's validation loss; returns the learning rate to use next.
    pub fn step(&mut self, val_loss: f64, lr: f64) -> f64 {
        if val_loss < self.best {
            self.best       = val_loss;
            self.bad_epochs = 0;
            return lr;
        }

        self.bad_epochs += 1;
        if self.bad_epochs >= self.patience {
            self.bad_epochs = 0;
            let reduced = lr * self.factor;
            tracing::info!("Reducing learning rate {:.3e} → {:.3e}", lr, reduced);
            return reduced;
        }
        lr
    }
}
