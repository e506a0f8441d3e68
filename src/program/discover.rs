use std::collections::HashSet;

use log::{ debug, trace };

use crate::arch::{ Flow, Inst, resolve_indirect };
use crate::config::ScanMarkers;
use crate::error::{ Stage, TranslateError, TranslateResult };
use crate::memory::{ MemoryImage, MemoryLayout };

// ------------------------------------------------------------------------------------------------
// Discovery
// ------------------------------------------------------------------------------------------------

/// What a discovery scan found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
	/// Where execution starts (from the reset vector).
	pub entry:     u16,
	/// Every address that must begin a block: the entry point and every static control-flow
	/// destination.
	pub leaders:   HashSet<u16>,
	/// `(site, destination)` of every control transfer seen, in scan order.
	pub transfers: Vec<(u16, u16)>,
	/// How many instructions were decoded.
	pub scanned:   usize,
}

impl Discovery {
	/// Is `addr` a leader?
	pub fn is_leader(&self, addr: u16) -> bool {
		self.leaders.contains(&addr)
	}
}

// ------------------------------------------------------------------------------------------------
// discover
// ------------------------------------------------------------------------------------------------

/// Scans the image linearly from the entry point, collecting leaders. The scan doesn't follow
/// control flow; it decodes everything after the entry point until it runs off the end of memory
/// or reaches the `stop` marker. Reaching the `resume` marker moves the cursor to the I/O service
/// routine (once).
///
/// Fails only if an indirect jump goes through a writable pointer.
pub fn discover(img: &MemoryImage, layout: &MemoryLayout, markers: &ScanMarkers)
-> TranslateResult<Discovery> {
	let entry = img.entry_point();
	let mut ret = Discovery {
		entry,
		leaders:   HashSet::new(),
		transfers: Vec::new(),
		scanned:   0,
	};

	ret.leaders.insert(entry);

	let mut cursor = entry as u32;
	let mut resumed = false;

	while cursor <= 0xFFFF {
		let at = cursor as u16;

		if markers.stop == Some(at) {
			trace!("scan stopped at table start ${:04X}", at);
			break;
		}

		if let Some((marker, resume_at)) = markers.resume {
			if marker == at && !resumed {
				trace!("scan resumes at ${:04X}", resume_at);
				resumed = true;
				cursor = resume_at as u32;
				continue;
			}
		}

		let inst = match Inst::decode(img, at) {
			Ok(inst) => inst,
			// the last few bytes of memory can't hold a whole instruction.
			Err(TranslateError::OutOfBytes { .. }) => break,
			Err(e) => return Err(e),
		};

		let dest = match inst.flow() {
			Flow::Cond | Flow::Jump | Flow::Call => inst.target(),
			Flow::IndirJump => Some(resolve_indirect(img, layout, at, inst.operand().value, Stage::Discovery)?),
			_ => None,
		};

		if let Some(dest) = dest {
			trace!("${:04X}: {} -> leader ${:04X}", at, inst, dest);
			ret.leaders.insert(dest);
			ret.transfers.push((at, dest));
		}

		ret.scanned += 1;
		cursor = inst.end();
	}

	debug!("discovery: {} instructions, {} leaders", ret.scanned, ret.leaders.len());
	Ok(ret)
}
