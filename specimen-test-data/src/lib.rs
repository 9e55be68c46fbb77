//! test data shared between the specimen crate's unit and integration tests.
//!
//! Fonts here are synthetic: a table directory with a `head` table and an
//! `SVG ` table, which is all the specimen tools ever look at.

pub mod shaper;

/// Units per em of every font built by [`svg_font`].
pub const UPEM: u16 = 1000;

/// Glyphs 5 and 6, sharing a definitions section.
pub static SQUARES_DOC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.1">
  <defs>
    <linearGradient id="fade" x1="0" y1="0" x2="1" y2="0">
      <stop offset="0" stop-color="#ff0000"/>
      <stop offset="1" stop-color="#0000ff"/>
    </linearGradient>
    <path id="square" d="M0,0 L10,0 L10,-10 L0,-10 Z"/>
  </defs>
  <g id="glyph5">
    <use xlink:href="#square" fill="url(#fade)"/>
  </g>
  <g id="glyph6">
    <path d="M0,0 L4,0 L4,-4 Z" fill="#00ff00"/>
  </g>
</svg>"##;

/// Glyph 12; reuses the id `square` to exercise prefixing.
pub static SCALED_DOC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.1">
  <defs>
    <rect id="square" x="0" y="-8" width="8" height="8"/>
  </defs>
  <g id="glyph12">
    <use xlink:href="#square" x="1" transform="scale(2)"/>
  </g>
</svg>"##;

/// Covers glyphs 20..=21, overlapping [`OVERLAP_B_DOC`] at glyph 20.
pub static OVERLAP_A_DOC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" version="1.1">
  <defs/>
  <g id="glyph20"><circle cx="5" cy="-5" r="5"/></g>
  <g id="glyph21"><ellipse cx="5" cy="-3" rx="5" ry="3"/></g>
</svg>"##;

/// Covers glyph 20 only.
pub static OVERLAP_B_DOC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" version="1.1">
  <defs/>
  <g id="glyph20"><rect x="0" y="-1" width="1" height="1"/></g>
</svg>"##;

/// Glyph 30 refers to glyph 31, which only exists as a glyph of its own.
pub static DANGLING_DOC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.1">
  <defs/>
  <g id="glyph30"><use xlink:href="#glyph31"/></g>
  <g id="glyph31"><rect x="0" y="-2" width="2" height="2"/></g>
</svg>"##;

/// Glyph 40 already carries a transform.
pub static PRE_TRANSFORMED_DOC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" version="1.1">
  <defs/>
  <g id="glyph40" transform="translate(3, 3)"><rect x="0" y="0" width="1" height="1"/></g>
</svg>"##;

/// A font whose document list holds all of the documents above, in order.
pub fn sample_font() -> Vec<u8> {
    svg_font(
        UPEM,
        &[
            (5, 6, SQUARES_DOC),
            (12, 12, SCALED_DOC),
            (20, 21, OVERLAP_A_DOC),
            (20, 20, OVERLAP_B_DOC),
            (30, 31, DANGLING_DOC),
            (40, 40, PRE_TRANSFORMED_DOC),
        ],
    )
}

/// Build a minimal font binary with a `head` table and an `SVG ` table
/// containing the given `(start_glyph, end_glyph, document)` records.
pub fn svg_font(units_per_em: u16, documents: &[(u16, u16, &str)]) -> Vec<u8> {
    let raw: Vec<_> = documents
        .iter()
        .map(|(start, end, doc)| (*start, *end, doc.as_bytes()))
        .collect();
    let tables = [
        (*b"SVG ", svg_table(&raw)),
        (*b"head", head_table(units_per_em)),
    ];
    sfnt(&tables)
}

/// Build an `SVG ` table from raw document payloads.
pub fn svg_table(documents: &[(u16, u16, &[u8])]) -> Vec<u8> {
    const HEADER_LEN: u32 = 10;
    const RECORD_LEN: u32 = 12;
    let mut buf = BeBuffer::default();
    buf.push_u16(0);
    buf.push_u32(HEADER_LEN);
    buf.push_u32(0);

    buf.push_u16(documents.len() as u16);
    let mut doc_offset = 2 + RECORD_LEN * documents.len() as u32;
    for (start, end, data) in documents {
        buf.push_u16(*start);
        buf.push_u16(*end);
        buf.push_u32(doc_offset);
        buf.push_u32(data.len() as u32);
        doc_offset += data.len() as u32;
    }
    for (_, _, data) in documents {
        buf.extend(data);
    }
    buf.0
}

/// A 54 byte `head` table; only `unitsPerEm` and the magic number are meaningful.
pub fn head_table(units_per_em: u16) -> Vec<u8> {
    let mut buf = BeBuffer::default();
    buf.push_u32(0x0001_0000); // version
    buf.push_u32(0x0001_0000); // fontRevision
    buf.push_u32(0); // checksumAdjustment
    buf.push_u32(0x5F0F_3CF5); // magicNumber
    buf.push_u16(0); // flags
    buf.push_u16(units_per_em);
    buf.extend(&[0; 16]); // created, modified
    buf.extend(&[0; 8]); // xMin, yMin, xMax, yMax
    buf.push_u16(0); // macStyle
    buf.push_u16(8); // lowestRecPPEM
    buf.push_u16(2); // fontDirectionHint
    buf.push_u16(0); // indexToLocFormat
    buf.push_u16(0); // glyphDataFormat
    buf.0
}

/// Wrap tables in a TrueType table directory. Tags must be sorted.
pub fn sfnt(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = 15 - num_tables.max(1).leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 16;

    let mut buf = BeBuffer::default();
    buf.push_u32(0x0001_0000);
    buf.push_u16(num_tables);
    buf.push_u16(search_range);
    buf.push_u16(entry_selector);
    buf.push_u16(num_tables * 16 - search_range);

    let mut offset = 12 + 16 * tables.len() as u32;
    for (tag, data) in tables {
        buf.extend(tag);
        buf.push_u32(0); // checksum, not verified on read
        buf.push_u32(offset);
        buf.push_u32(data.len() as u32);
        offset += padded_len(data.len()) as u32;
    }
    for (_, data) in tables {
        buf.extend(data);
        buf.extend(&vec![0; padded_len(data.len()) - data.len()]);
    }
    buf.0
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

#[derive(Default)]
struct BeBuffer(Vec<u8>);

impl BeBuffer {
    fn push_u16(&mut self, value: u16) {
        self.0.extend(value.to_be_bytes());
    }

    fn push_u32(&mut self, value: u32) {
        self.0.extend(value.to_be_bytes());
    }

    fn extend(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }
}
