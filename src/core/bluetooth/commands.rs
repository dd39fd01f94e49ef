//! ESC/POS printer commands
//! This module contains the control sequences the transfer engine emits.
//! The byte values are fixed hardware constants, not negotiated; they must
//! stay bit-exact for compatibility with the deployed printer population.

/// Printer control commands (ESC/POS subset)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterCommand {
    /// Hardware reset to power-on defaults (ESC @)
    Init,
    /// Left-align subsequent text (ESC a 0)
    AlignLeft,
    /// Center subsequent text (ESC a 1)
    AlignCenter,
    /// Right-align subsequent text (ESC a 2)
    AlignRight,
    /// Emphasized mode on (ESC E 1)
    BoldOn,
    /// Emphasized mode off (ESC E 0)
    BoldOff,
    /// Partial paper cut (GS V 1)
    PartialCut,
    /// Feed n lines (ESC d n)
    Feed(u8),
    /// Normal character size (GS ! 0x00)
    SizeNormal,
    /// Double width and height (GS ! 0x11)
    SizeLarge,
    /// Cash drawer kick on pin 2 (ESC p 0 25 250)
    DrawerKick,
}

impl PrinterCommand {
    /// Convert the command to its byte representation
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Init => vec![0x1B, 0x40],
            Self::AlignLeft => vec![0x1B, 0x61, 0x00],
            Self::AlignCenter => vec![0x1B, 0x61, 0x01],
            Self::AlignRight => vec![0x1B, 0x61, 0x02],
            Self::BoldOn => vec![0x1B, 0x45, 0x01],
            Self::BoldOff => vec![0x1B, 0x45, 0x00],
            Self::PartialCut => vec![0x1D, 0x56, 0x01],
            Self::Feed(lines) => vec![0x1B, 0x64, *lines],
            Self::SizeNormal => vec![0x1D, 0x21, 0x00],
            Self::SizeLarge => vec![0x1D, 0x21, 0x11],
            Self::DrawerKick => vec![0x1B, 0x70, 0x00, 0x19, 0xFA],
        }
    }
}

/// Concatenate a command sequence into one outbound payload
pub fn encode_sequence(commands: &[PrinterCommand]) -> Vec<u8> {
    let mut payload = Vec::new();
    for command in commands {
        payload.extend_from_slice(&command.to_bytes());
    }
    payload
}
