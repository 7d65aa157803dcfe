// Platform primitives: one implementation per target OS, picked at build time
#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::*;

#[cfg(not(unix))]
compile_error!("nutsock-transport only provides socket primitives for unix targets");
