//! chatviz
//!
//! Turn the loosely-shaped chart payloads of a question-answering backend into consistent,
//! renderable charts. Pairs with the `chatviz` CLI and the `chatviz-gui` desktop app.
//!
//! ### Features
//! - Normalize ragged label/series payloads into a rectangular table
//! - Build datasets for bar, horizontal bar, line, pie and scatter charts
//! - Toggle series, switch chart kind, stack bars; draw to SVG/PNG
//! - Export the original data as CSV
//! - Upload tables to and query the backend
//!
//! ### Example
//! ```no_run
//! use chatviz::{ChartKind, Client, ControlPanel};
//!
//! let client = Client::default();
//! let table = client.upload("sales.csv")?;
//! let reply = client.query("sales per region", &table.table_name)?;
//! if let Some(raw) = reply.formatted_data_for_visualization {
//!     let mut panel = ControlPanel::new(raw, reply.visualization.as_deref());
//!     panel.select_chart_kind(ChartKind::Line);
//!     chatviz::viz::plot_chart(panel.rendered(), "sales.svg", 800, 420)?;
//!     chatviz::export::save_csv(panel.raw(), ".")?;
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod client;
pub mod control;
pub mod dataset;
pub mod export;
pub mod models;
pub mod normalize;
pub mod session;
pub mod viz;

pub use client::{Client, ClientError};
pub use control::{ControlPanel, LegendEntry, ViewState};
pub use dataset::{ChartDataset, SeriesVisibility};
pub use models::{QueryResponse, Series, UploadResponse, VisualizationPayload};
pub use normalize::{NormalizedTable, TableSeries, normalize};
pub use session::{ChatMessage, Role, Session, TableContext};
pub use viz::{ChartKind, RenderOptions, Rendered, UnsupportedKind};
