mod output_picker;
mod overwrite_prompt;
mod recorder_window;
mod recording_hud;

pub use recorder_window::build_recorder_window;
