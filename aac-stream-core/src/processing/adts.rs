//! ADTS framing and AudioSpecificConfig helpers.
//!
//! ADTS header layout (7 bytes, no CRC):
//! ```text
//! syncword(12) id(1) layer(2) protection_absent(1)
//! profile(2) sampling_frequency_index(4) private(1) channel_config(3)
//! original(1) home(1) copyright_id(1) copyright_start(1)
//! frame_length(13) buffer_fullness(11) raw_data_blocks(2)
//! ```

/// Size of an ADTS header without CRC.
pub const ADTS_HEADER_SIZE: usize = 7;

/// Largest frame the 13-bit length field can describe.
pub const ADTS_MAX_FRAME_SIZE: usize = (1 << 13) - 1;

const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// MPEG-4 sampling frequency index, or `None` for a non-standard rate.
pub fn sampling_frequency_index(sample_rate: u32) -> Option<u8> {
    SAMPLING_FREQUENCIES
        .iter()
        .position(|&rate| rate == sample_rate)
        .map(|i| i as u8)
}

/// Build the 7-byte ADTS header for a payload of `payload_len` bytes.
///
/// Returns `None` when the rate has no frequency index, the channel count
/// cannot be signalled, or the frame would overflow the length field.
pub fn adts_header(
    object_type: u8,
    sample_rate: u32,
    channels: u32,
    payload_len: usize,
) -> Option<[u8; ADTS_HEADER_SIZE]> {
    let freq_index = sampling_frequency_index(sample_rate)?;
    if object_type == 0 || object_type > 4 || channels == 0 || channels > 7 {
        return None;
    }
    let frame_len = payload_len + ADTS_HEADER_SIZE;
    if frame_len > ADTS_MAX_FRAME_SIZE {
        return None;
    }

    let profile = object_type - 1;
    let channels = channels as u8;
    let frame_len = frame_len as u16;

    let mut header = [0u8; ADTS_HEADER_SIZE];
    header[0] = 0xFF;
    header[1] = 0xF1; // MPEG-4, layer 0, no CRC
    header[2] = (profile << 6) | (freq_index << 2) | ((channels >> 2) & 0x01);
    header[3] = ((channels & 0x03) << 6) | ((frame_len >> 11) as u8 & 0x03);
    header[4] = ((frame_len >> 3) & 0xFF) as u8;
    header[5] = (((frame_len & 0x07) as u8) << 5) | 0x1F; // buffer fullness 0x7FF (VBR)
    header[6] = 0xFC;
    Some(header)
}

/// Two-byte AudioSpecificConfig for `object_type` at `sample_rate`/`channels`.
pub fn audio_specific_config(object_type: u8, sample_rate: u32, channels: u32) -> Option<[u8; 2]> {
    let freq_index = sampling_frequency_index(sample_rate)?;
    if object_type == 0 || object_type > 30 || channels > 7 {
        return None;
    }
    let channels = channels as u8;
    Some([
        (object_type << 3) | (freq_index >> 1),
        ((freq_index & 0x01) << 7) | (channels << 3),
    ])
}

/// Frame length encoded in an ADTS header (header bytes included).
pub fn frame_length(header: &[u8]) -> Option<usize> {
    if header.len() < ADTS_HEADER_SIZE || header[0] != 0xFF || header[1] & 0xF0 != 0xF0 {
        return None;
    }
    let len = ((header[3] as usize & 0x03) << 11) | ((header[4] as usize) << 3) | (header[5] as usize >> 5);
    Some(len)
}
