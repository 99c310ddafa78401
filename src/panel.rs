use anyhow::Result;

/// Native resolution of the 7.5" panel this project targets.
pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 480;

/// The physical panel driver, one call per transmission.
///
/// This mirrors the primitives of the vendor SDK so a SPI-backed
/// implementation can slot in without touching the core. Failures are
/// process-fatal: a partially transmitted frame leaves the panel in an
/// unknown state, so nothing here is retried.
pub trait Panel {
    /// Switch the panel into full-refresh mode.
    fn init(&mut self) -> Result<()>;

    /// Switch the panel into partial-refresh mode.
    fn init_partial_mode(&mut self) -> Result<()>;

    /// Blank the physical panel.
    fn clear(&mut self) -> Result<()>;

    /// Transmit a full frame, packed in panel polarity.
    fn display(&mut self, buffer: &[u8]) -> Result<()>;

    /// Transmit a byte-expanded scan buffer for the pixel rectangle
    /// `(x0, y0)..(x1, y1)`.
    fn display_partial(&mut self, buffer: &[u8], x0: u32, y0: u32, x1: u32, y1: u32)
        -> Result<()>;
}

/// Logs transmissions instead of driving hardware. Useful when running on a
/// machine without the panel attached.
pub struct SimulatedPanel;

impl Panel for SimulatedPanel {
    fn init(&mut self) -> Result<()> {
        log::info!("panel: full refresh mode");
        Ok(())
    }

    fn init_partial_mode(&mut self) -> Result<()> {
        log::info!("panel: partial refresh mode");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        log::info!("panel: clear");
        Ok(())
    }

    fn display(&mut self, buffer: &[u8]) -> Result<()> {
        log::info!("panel: full frame, {} bytes", buffer.len());
        Ok(())
    }

    fn display_partial(
        &mut self,
        buffer: &[u8],
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
    ) -> Result<()> {
        log::info!(
            "panel: partial frame ({x0},{y0})..({x1},{y1}), {} bytes",
            buffer.len()
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PanelOp {
        Init,
        InitPartial,
        Clear,
        Full(Vec<u8>),
        Partial {
            data: Vec<u8>,
            x0: u32,
            y0: u32,
            x1: u32,
            y1: u32,
        },
    }

    /// Records every driver call for assertions. The shared log handle
    /// stays usable after the panel has been moved into a `Display`.
    pub struct MockPanel {
        ops: Arc<Mutex<Vec<PanelOp>>>,
    }

    impl MockPanel {
        pub fn new() -> (Self, Arc<Mutex<Vec<PanelOp>>>) {
            let ops = Arc::new(Mutex::new(Vec::new()));
            (Self { ops: ops.clone() }, ops)
        }

        fn record(&self, op: PanelOp) {
            self.ops.lock().unwrap().push(op);
        }
    }

    impl Panel for MockPanel {
        fn init(&mut self) -> Result<()> {
            self.record(PanelOp::Init);
            Ok(())
        }

        fn init_partial_mode(&mut self) -> Result<()> {
            self.record(PanelOp::InitPartial);
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            self.record(PanelOp::Clear);
            Ok(())
        }

        fn display(&mut self, buffer: &[u8]) -> Result<()> {
            self.record(PanelOp::Full(buffer.to_vec()));
            Ok(())
        }

        fn display_partial(
            &mut self,
            buffer: &[u8],
            x0: u32,
            y0: u32,
            x1: u32,
            y1: u32,
        ) -> Result<()> {
            self.record(PanelOp::Partial {
                data: buffer.to_vec(),
                x0,
                y0,
                x1,
                y1,
            });
            Ok(())
        }
    }
}
