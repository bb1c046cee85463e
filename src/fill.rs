// Buffer fill workload
//
// The GPU writes three overlapping regions into a 256 byte buffer: a word
// fill over the whole buffer, then two 64 byte patches on top. Host-side
// oracles mirror the recorded commands so readback can be checked byte for
// byte.

use ash::vk;

/// Buffer size in bytes.
pub const SIZE: vk::DeviceSize = 256;

/// Word written by the fill command. Little-endian, so the buffer reads as
/// the byte sequence 01 02 03 04 repeating.
pub const FILL_WORD: u32 = 0x0403_0201;

/// Values printed per output line.
pub const VALUES_PER_LINE: usize = 16;

const PATCH_A_OFFSET: vk::DeviceSize = 64;
const PATCH_B_OFFSET: vk::DeviceSize = 128;
const PATCH_LEN: usize = 64;
const PATCH_A_BYTE: u8 = 0x08;
const PATCH_B_BYTE: u8 = 0x09;

/// Ascending bytes used as the buffer's initial contents, so a command that
/// silently did nothing is visible in the readback.
pub fn seed() -> Vec<u8> {
    (0..SIZE).map(|i| i as u8).collect()
}

/// Record the fill sequence: whole-buffer word fill, then the two patches.
///
/// No barriers are inserted between the writes. The caller waits for the
/// queue to drain before mapping, and the buffer memory is host-coherent.
pub fn record(device: &ash::Device, cmd: vk::CommandBuffer, buffer: vk::Buffer) {
    unsafe {
        device.cmd_fill_buffer(cmd, buffer, 0, vk::WHOLE_SIZE, FILL_WORD);
        device.cmd_update_buffer(cmd, buffer, PATCH_A_OFFSET, &[PATCH_A_BYTE; PATCH_LEN]);
        device.cmd_update_buffer(cmd, buffer, PATCH_B_OFFSET, &[PATCH_B_BYTE; PATCH_LEN]);
    }
}

/// The byte layout the recorded commands produce.
pub fn expected() -> Vec<u8> {
    let word = FILL_WORD.to_le_bytes();
    let mut bytes: Vec<u8> = word.iter().copied().cycle().take(SIZE as usize).collect();

    bytes[PATCH_A_OFFSET as usize..][..PATCH_LEN].fill(PATCH_A_BYTE);
    bytes[PATCH_B_OFFSET as usize..][..PATCH_LEN].fill(PATCH_B_BYTE);
    bytes
}

/// Render bytes as unsigned integers, sixteen per line.
pub fn format_table(bytes: &[u8]) -> String {
    bytes
        .chunks(VALUES_PER_LINE)
        .map(|row| {
            row.iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_ascending_bytes() {
        let seed = seed();
        assert_eq!(seed.len(), 256);
        assert_eq!(seed[0], 0);
        assert_eq!(seed[127], 127);
        assert_eq!(seed[255], 255);
    }

    #[test]
    fn expected_layout_matches_recorded_commands() {
        let bytes = expected();
        assert_eq!(bytes.len(), 256);

        // Word fill, little-endian
        assert_eq!(&bytes[0..8], &[1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(bytes[63], 4);

        // First patch covers [64, 128)
        assert!(bytes[64..128].iter().all(|&b| b == 8));

        // Second patch covers [128, 192)
        assert!(bytes[128..192].iter().all(|&b| b == 9));

        // Tail keeps the fill pattern
        assert_eq!(&bytes[192..196], &[1, 2, 3, 4]);
        assert_eq!(bytes[255], 4);
    }

    #[test]
    fn table_formats_sixteen_values_per_line() {
        let table = format_table(&expected());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 16);
        assert_eq!(lines[0], "1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4");
        assert_eq!(lines[4], "8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8");
        assert_eq!(lines[8], "9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9");
        assert_eq!(lines[12], lines[0]);
        assert_eq!(lines[15], lines[0]);
    }

    #[test]
    fn short_final_row_is_not_padded() {
        let table = format_table(&[10, 11, 12]);
        assert_eq!(table, "10, 11, 12");
    }
}
