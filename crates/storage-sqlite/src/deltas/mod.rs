mod model;
mod repository;

pub use model::{ClassDeltaMoneyDB, ClassDeltaQtyDB, ItemDeltaQtyDB};
pub use repository::DeltaRepository;
