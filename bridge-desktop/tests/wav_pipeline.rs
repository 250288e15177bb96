//! End-to-end tests for the symphonia extractor and codec against generated
//! WAV files.

use bridge_desktop::{SymphoniaCodecFactory, SymphoniaExtractorFactory};
use bridge_traits::{
    BufferFlags, BufferInfo, CodecBuffer, CodecFactory, ContentLocator, DequeueOutput,
    ExtractorFactory, MediaCodec, MediaExtractor,
};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const TIMEOUT: Duration = Duration::from_millis(10);

fn write_wav(sample_rate: u32, channels: u16, frames: usize) -> NamedTempFile {
    let data_len = (frames * channels as usize * 2) as u32;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
    bytes.extend_from_slice(&(channels * 2).to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for frame in 0..frames {
        for channel in 0..channels {
            let value = ((frame % 200) as i16 - 100) * 100 + channel as i16;
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }

    let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    file
}

fn open(file: &NamedTempFile) -> Box<dyn MediaExtractor> {
    SymphoniaExtractorFactory::new()
        .open(&ContentLocator::from_path(file.path()))
        .unwrap()
}

#[test]
fn test_extractor_describes_pcm_track() {
    let file = write_wav(44_100, 2, 4_410);
    let extractor = open(&file);

    assert_eq!(extractor.track_count(), 1);
    let format = extractor.track_format(0).unwrap();
    assert_eq!(format.mime(), Some("audio/raw"));
    assert_eq!(format.sample_rate(), Some(44_100));
    assert_eq!(format.channel_count(), Some(2));
    assert_eq!(format.duration_us(), Some(100_000));
}

#[test]
fn test_extractor_reads_units_in_order_until_exhausted() {
    let file = write_wav(8_000, 1, 8_000);
    let mut extractor = open(&file);
    let mut buffer = CodecBuffer::with_capacity(0);

    assert_eq!(extractor.read_sample_data(&mut buffer, 0), None);
    extractor.select_track(0).unwrap();

    let mut total_bytes = 0;
    let mut last_time = None;
    loop {
        let Some(size) = extractor.read_sample_data(&mut buffer, 0) else {
            break;
        };
        let time = extractor.sample_time().unwrap();
        if let Some(previous) = last_time {
            assert!(time > previous);
        }
        last_time = Some(time);
        total_bytes += size;
        if !extractor.advance() {
            break;
        }
    }

    assert_eq!(total_bytes, 8_000 * 2);
    assert_eq!(extractor.read_sample_data(&mut buffer, 0), None);
    assert_eq!(extractor.sample_time(), None);
}

#[test]
fn test_codec_decodes_whole_file() {
    let file = write_wav(44_100, 2, 22_050);
    let mut extractor = open(&file);
    let format = extractor.track_format(0).unwrap();
    extractor.select_track(0).unwrap();

    let mut codec = SymphoniaCodecFactory::new()
        .create_decoder_by_type(format.mime().unwrap())
        .unwrap();
    codec.configure(&format).unwrap();
    codec.start().unwrap();

    let mut info = BufferInfo::default();
    let mut input_done = false;
    let mut format_changes = 0;
    let mut decoded_samples = 0;
    let mut first_samples = Vec::new();

    loop {
        if !input_done {
            if let Some(index) = codec.dequeue_input_buffer(TIMEOUT) {
                let slot = codec.input_buffer(index).unwrap();
                let read = extractor.read_sample_data(&mut slot.lock(), 0);
                match read {
                    Some(size) => {
                        let time = extractor.sample_time().unwrap();
                        codec
                            .queue_input_buffer(index, 0, size, time, BufferFlags::NONE)
                            .unwrap();
                        extractor.advance();
                    }
                    None => {
                        input_done = true;
                        codec
                            .queue_input_buffer(index, 0, 0, 0, BufferFlags::END_OF_STREAM)
                            .unwrap();
                    }
                }
            }
        }

        match codec.dequeue_output_buffer(&mut info, TIMEOUT) {
            DequeueOutput::Buffer(index) => {
                let slot = codec.output_buffer(index).unwrap();
                let bytes = slot.lock().as_slice().to_vec();
                assert_eq!(bytes.len(), info.size);
                if first_samples.is_empty() && bytes.len() >= 4 {
                    first_samples = vec![
                        i16::from_ne_bytes([bytes[0], bytes[1]]),
                        i16::from_ne_bytes([bytes[2], bytes[3]]),
                    ];
                }
                decoded_samples += bytes.len() / 2;
                codec.release_output_buffer(index, false).unwrap();
                if info.flags.is_end_of_stream() {
                    break;
                }
            }
            DequeueOutput::FormatChanged => {
                format_changes += 1;
                let output = codec.output_format();
                assert_eq!(output.sample_rate(), Some(44_100));
                assert_eq!(output.channel_count(), Some(2));
            }
            DequeueOutput::TryAgainLater | DequeueOutput::BuffersChanged => {}
            DequeueOutput::Unexpected(code) => panic!("unexpected decoder status {}", code),
        }
    }

    assert_eq!(format_changes, 1);
    assert_eq!(decoded_samples, 22_050 * 2);
    assert_eq!(first_samples, vec![-10_000, -9_999]);

    codec.stop().unwrap();
    codec.release();
    extractor.release();
}

/// One block of mono IMA ADPCM (format tag 0x0011), 505 frames.
fn write_ima_adpcm_wav(sample_rate: u32) -> NamedTempFile {
    const BLOCK_ALIGN: u16 = 256;
    const FRAMES_PER_BLOCK: u16 = 505;

    let mut block = vec![0u8; BLOCK_ALIGN as usize];
    // Predictor 0, step index 0, then nibbles
    for (i, byte) in block.iter_mut().enumerate().skip(4) {
        *byte = (i % 16) as u8 | 0x10;
    }

    let mut fmt = Vec::new();
    fmt.extend_from_slice(&0x0011u16.to_le_bytes());
    fmt.extend_from_slice(&1u16.to_le_bytes());
    fmt.extend_from_slice(&sample_rate.to_le_bytes());
    let byte_rate = sample_rate * u32::from(BLOCK_ALIGN) / u32::from(FRAMES_PER_BLOCK);
    fmt.extend_from_slice(&byte_rate.to_le_bytes());
    fmt.extend_from_slice(&BLOCK_ALIGN.to_le_bytes());
    fmt.extend_from_slice(&4u16.to_le_bytes());
    fmt.extend_from_slice(&2u16.to_le_bytes());
    fmt.extend_from_slice(&FRAMES_PER_BLOCK.to_le_bytes());

    let mut body = Vec::new();
    body.extend_from_slice(b"WAVE");
    body.extend_from_slice(b"fmt ");
    body.extend_from_slice(&(fmt.len() as u32).to_le_bytes());
    body.extend_from_slice(&fmt);
    body.extend_from_slice(b"fact");
    body.extend_from_slice(&4u32.to_le_bytes());
    body.extend_from_slice(&u32::from(FRAMES_PER_BLOCK).to_le_bytes());
    body.extend_from_slice(b"data");
    body.extend_from_slice(&(block.len() as u32).to_le_bytes());
    body.extend_from_slice(&block);

    let mut bytes = Vec::with_capacity(8 + body.len());
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&body);

    let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_extractor_exposes_adpcm_track() {
    let file = write_ima_adpcm_wav(8_000);
    let extractor = open(&file);

    assert_eq!(extractor.track_count(), 1);
    let format = extractor.track_format(0).unwrap();
    assert_eq!(format.mime(), Some("audio/x-adpcm-ima"));
    assert_eq!(format.sample_rate(), Some(8_000));
    assert_eq!(format.channel_count(), Some(1));
}

#[test]
fn test_codec_factory_rejects_codecs_without_decoder() {
    let factory = SymphoniaCodecFactory::new();
    let unmapped = format!("{}0xdead", bridge_desktop::UNMAPPED_MIME_PREFIX);

    assert!(matches!(
        factory.create_decoder_by_type(&unmapped),
        Err(bridge_traits::BridgeError::UnsupportedMime(_))
    ));
}
