mod resources;
mod waits;
