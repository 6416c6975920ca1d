// In-memory host implementations: a headless page, scripted media devices,
// tab-scoped storage and a recording backend.
pub mod media;
pub mod surface;
pub mod test;
