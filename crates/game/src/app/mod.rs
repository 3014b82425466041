mod explore;

pub use explore::ExploreScreen;
