// Purpose - external interfaces, file formats

pub mod wav;

pub use wav::{encode_wav_16bit, pcm16_spec, write_wav_16bit};
