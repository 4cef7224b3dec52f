//! Supervisor bookkeeping for the CLI
//!
//! Records which process supervises smbd in a state directory and on which
//! port, so `loopshare status` can report it.

mod state;

pub use state::{
    SupervisorState, clear_supervisor_state, is_process_alive, read_supervisor_state,
    state_file_path, write_supervisor_state,
};
