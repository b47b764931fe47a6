pub mod axis_split;
pub mod ceil_div;
pub mod cell_median;
pub mod cell_splitter;
pub mod cell_stats;
pub mod grid;
pub mod luma_frame;
pub mod utils;
