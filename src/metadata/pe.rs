// Locating the CLI metadata root inside a PE image.

use super::{MetadataError, Result};
use goblin::pe::PE;
use goblin::pe::options::ParseOptions;
use goblin::pe::section_table::SectionTable;
use goblin::pe::utils::find_offset;

/// Offset of the metadata directory within the CLR runtime header.
const COR20_METADATA: usize = 8;

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    bytes
        .get(offset..offset.saturating_add(4))
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(MetadataError::Truncated("PE image"))
}

/// Maps a relative virtual address to a file offset through the section table.
pub fn rva_to_offset(sections: &[SectionTable], file_alignment: u32, rva: u32) -> Option<usize> {
    find_offset(rva as usize, sections, file_alignment, &ParseOptions::default())
}

/// Returns the bytes of the metadata root (starting at the `BSJB` signature).
pub fn metadata_root(bytes: &[u8]) -> Result<&[u8]> {
    let pe = PE::parse(bytes).map_err(|e| MetadataError::NotPe(e.to_string()))?;
    let optional_header = pe
        .header
        .optional_header
        .ok_or_else(|| MetadataError::NotPe("missing optional header".to_string()))?;

    let clr = optional_header
        .data_directories
        .get_clr_runtime_header()
        .filter(|dir| dir.virtual_address != 0)
        .ok_or(MetadataError::NotManaged)?;

    let file_alignment = optional_header.windows_fields.file_alignment;
    let cor20 = rva_to_offset(&pe.sections, file_alignment, clr.virtual_address)
        .ok_or(MetadataError::Truncated("CLR runtime header"))?;
    let metadata_rva = read_u32(bytes, cor20.saturating_add(COR20_METADATA))?;
    let metadata_size = read_u32(bytes, cor20.saturating_add(COR20_METADATA + 4))? as usize;
    let start = rva_to_offset(&pe.sections, file_alignment, metadata_rva)
        .ok_or(MetadataError::Truncated("metadata directory"))?;

    bytes
        .get(start..start.saturating_add(metadata_size))
        .ok_or(MetadataError::Truncated("metadata root"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(virtual_address: u32, virtual_size: u32, pointer_to_raw_data: u32) -> SectionTable {
        SectionTable {
            virtual_address,
            virtual_size,
            size_of_raw_data: virtual_size,
            pointer_to_raw_data,
            ..SectionTable::default()
        }
    }

    #[test]
    fn rva_maps_through_containing_section() {
        let sections = [section(0x2000, 0x1000, 0x200), section(0x4000, 0x200, 0x1200)];
        assert_eq!(rva_to_offset(&sections, 0x200, 0x2050), Some(0x250));
        assert_eq!(rva_to_offset(&sections, 0x200, 0x4000), Some(0x1200));
        assert_eq!(rva_to_offset(&sections, 0x200, 0x3500), None);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn offsets_past_u32_range_do_not_overflow() {
        let sections = [section(0xFFFF_E000, 0x1000, 0xFFFF_FE00)];
        assert_eq!(rva_to_offset(&sections, 0x200, 0xFFFF_E300), Some(0x1_0000_0100));
        // An alignment that is not a power of two maps nothing.
        assert_eq!(rva_to_offset(&sections, 0, 0xFFFF_E300), None);
    }

    #[test]
    fn non_pe_bytes_are_rejected() {
        assert!(matches!(
            metadata_root(b"definitely not a portable executable"),
            Err(MetadataError::NotPe(_))
        ));
    }
}
