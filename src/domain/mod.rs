// Domain layer - commit data model and pure chart logic
pub mod active;
pub mod commit;
pub mod index;
pub mod selection;
pub mod series;
pub mod simplify;
pub mod viewport;
