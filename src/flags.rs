//! Link flag bitmask
//!
//! The flag word in the header decides which optional sections follow it and
//! how wide StringData characters are. Decoders treat a clear bit as "section
//! absent" without looking at the bytes.

use bitflags::bitflags;

bitflags! {
    /// Bits of the header LinkFlags field
    pub struct LinkFlags: u32 {
        /// A LinkTargetIDList follows the header
        const HAS_LINK_TARGET_ID_LIST           = 0x0000_0001;
        /// A LinkInfo block is present
        const HAS_LINK_INFO                     = 0x0000_0002;
        /// NAME_STRING (description) is present
        const HAS_NAME                          = 0x0000_0004;
        /// RELATIVE_PATH is present
        const HAS_RELATIVE_PATH                 = 0x0000_0008;
        /// WORKING_DIR is present
        const HAS_WORKING_DIR                   = 0x0000_0010;
        /// COMMAND_LINE_ARGUMENTS is present
        const HAS_ARGUMENTS                     = 0x0000_0020;
        /// ICON_LOCATION is present
        const HAS_ICON_LOCATION                 = 0x0000_0040;
        /// StringData uses UTF-16LE instead of the ANSI code page
        const IS_UNICODE                        = 0x0000_0080;
        /// The LinkInfo block is ignored when resolving the target
        const FORCE_NO_LINK_INFO                = 0x0000_0100;
        /// An EnvironmentVariableDataBlock is present
        const HAS_EXP_STRING                    = 0x0000_0200;
        const RUN_IN_SEPARATE_PROCESS           = 0x0000_0400;
        const UNUSED_1                          = 0x0000_0800;
        const HAS_DARWIN_ID                     = 0x0000_1000;
        const RUN_AS_USER                       = 0x0000_2000;
        /// An IconEnvironmentDataBlock is present
        const HAS_EXP_ICON                      = 0x0000_4000;
        const NO_PIDL_ALIAS                     = 0x0000_8000;
        const UNUSED_2                          = 0x0001_0000;
        const RUN_WITH_SHIM_LAYER               = 0x0002_0000;
        const FORCE_NO_LINK_TRACK               = 0x0004_0000;
        const ENABLE_TARGET_METADATA            = 0x0008_0000;
        const DISABLE_LINK_PATH_TRACKING        = 0x0010_0000;
        const DISABLE_KNOWN_FOLDER_TRACKING     = 0x0020_0000;
        const DISABLE_KNOWN_FOLDER_ALIAS        = 0x0040_0000;
        const ALLOW_LINK_TO_LINK                = 0x0080_0000;
        const UNALIAS_ON_SAVE                   = 0x0100_0000;
        const PREFER_ENVIRONMENT_PATH           = 0x0200_0000;
        const KEEP_LOCAL_ID_LIST_FOR_UNC_TARGET = 0x0400_0000;
    }
}

/// Which optional sections an encoder is about to emit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionPresence {
    pub id_list: bool,
    pub link_info: bool,
    pub name: bool,
    pub relative_path: bool,
    pub working_dir: bool,
    pub arguments: bool,
    pub icon_location: bool,
    pub icon_environment: bool,
}

impl LinkFlags {
    /// Bits whose value is dictated by which sections are written
    pub fn section_bits() -> LinkFlags {
        LinkFlags::HAS_LINK_TARGET_ID_LIST
            | LinkFlags::HAS_LINK_INFO
            | LinkFlags::HAS_NAME
            | LinkFlags::HAS_RELATIVE_PATH
            | LinkFlags::HAS_WORKING_DIR
            | LinkFlags::HAS_ARGUMENTS
            | LinkFlags::HAS_ICON_LOCATION
            | LinkFlags::HAS_EXP_ICON
    }

    /// Split a raw flag word into the documented bits and the rest
    pub fn split(raw: u32) -> (LinkFlags, u32) {
        let known = LinkFlags::from_bits_truncate(raw);
        (known, raw & !LinkFlags::all().bits())
    }

    /// Reassemble the raw flag word written to disk
    pub fn join(self, unknown: u32) -> u32 {
        self.bits() | (unknown & !LinkFlags::all().bits())
    }

    /// Replace the section bits with the ones matching `sections`, keeping
    /// every behavioural bit untouched.
    pub fn with_sections(self, sections: &SectionPresence) -> LinkFlags {
        let mut flags = self - LinkFlags::section_bits();
        flags.set(LinkFlags::HAS_LINK_TARGET_ID_LIST, sections.id_list);
        flags.set(LinkFlags::HAS_LINK_INFO, sections.link_info);
        flags.set(LinkFlags::HAS_NAME, sections.name);
        flags.set(LinkFlags::HAS_RELATIVE_PATH, sections.relative_path);
        flags.set(LinkFlags::HAS_WORKING_DIR, sections.working_dir);
        flags.set(LinkFlags::HAS_ARGUMENTS, sections.arguments);
        flags.set(LinkFlags::HAS_ICON_LOCATION, sections.icon_location);
        flags.set(LinkFlags::HAS_EXP_ICON, sections.icon_environment);
        flags
    }

    pub fn is_unicode(&self) -> bool {
        self.contains(LinkFlags::IS_UNICODE)
    }
}

/// Flags for a freshly built link: exactly the sections present, Unicode strings
pub fn compute_flags(sections: &SectionPresence) -> LinkFlags {
    LinkFlags::IS_UNICODE.with_sections(sections)
}
