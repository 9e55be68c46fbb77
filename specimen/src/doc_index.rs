//! The SVG documents of a font, indexed by glyph range.
//!
//! See the [SVG table](https://learn.microsoft.com/en-us/typography/opentype/spec/svg)
//! specification for the layout read here.

use read_fonts::{
    tables::svg::SVGDocumentList, types::GlyphId, FontRef, ReadError, TableProvider,
};

use crate::Error;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// One record of the SVG document list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentRange<'a> {
    /// Position of the record in the font's document list.
    pub index: usize,
    pub start: GlyphId,
    pub end: GlyphId,
    pub data: &'a [u8],
}

impl<'a> DocumentRange<'a> {
    pub fn contains(&self, glyph_id: GlyphId) -> bool {
        (self.start..=self.end).contains(&glyph_id)
    }

    /// The document as text.
    pub fn text(&self) -> Result<&'a str, Error> {
        if self.data.starts_with(&GZIP_MAGIC) {
            return Err(Error::CompressedDocument(self.index));
        }
        std::str::from_utf8(self.data).map_err(|_| Error::NotUtf8(self.index))
    }
}

/// Result of looking up the document for a glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentMatch<'a> {
    None,
    One(DocumentRange<'a>),
    /// The glyph is covered by this many (overlapping) records.
    Many(usize),
}

/// The document list of a font's `SVG ` table, sorted by start glyph.
#[derive(Clone, Debug)]
pub struct SvgDocumentIndex<'a> {
    units_per_em: u16,
    ranges: Vec<DocumentRange<'a>>,
}

impl<'a> SvgDocumentIndex<'a> {
    pub fn new(font: &FontRef<'a>) -> Result<Self, Error> {
        let units_per_em = font.head()?.units_per_em();
        let svg = font.svg().map_err(|e| match e {
            ReadError::TableIsMissing(tag) => Error::MissingTable(tag),
            e => e.into(),
        })?;
        let mut ranges = read_document_list(&svg.svg_document_list()?)?;
        ranges.sort_by_key(|r| (r.start, r.index));
        log::debug!(
            "{} SVG documents, {units_per_em} units per em",
            ranges.len()
        );
        Ok(Self {
            units_per_em,
            ranges,
        })
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn ranges(&self) -> &[DocumentRange<'a>] {
        &self.ranges
    }

    /// Find the document covering `glyph_id`.
    pub fn lookup(&self, glyph_id: GlyphId) -> DocumentMatch<'a> {
        // every candidate starts at or before the glyph
        let candidates = self.ranges.partition_point(|r| r.start <= glyph_id);
        let mut matching = self.ranges[..candidates]
            .iter()
            .filter(|r| r.end >= glyph_id);
        match (matching.next(), matching.clone().count()) {
            (None, _) => DocumentMatch::None,
            (Some(range), 0) => DocumentMatch::One(*range),
            (Some(_), rest) => DocumentMatch::Many(rest + 1),
        }
    }
}

fn read_document_list<'a>(list: &SVGDocumentList<'a>) -> Result<Vec<DocumentRange<'a>>, Error> {
    // document offsets are relative to the start of the list
    let list_data = list.offset_data().as_bytes();
    list.document_records()
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let offset = record.svg_doc_offset() as usize;
            let data = list_data
                .get(offset..offset + record.svg_doc_length() as usize)
                .ok_or(ReadError::OutOfBounds)?;
            Ok(DocumentRange {
                index,
                start: record.start_glyph_id().into(),
                end: record.end_glyph_id().into(),
                data,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use specimen_test_data as test_data;

    #[test]
    fn reads_records() {
        let font_data = test_data::sample_font();
        let font = FontRef::new(&font_data).unwrap();
        let index = SvgDocumentIndex::new(&font).unwrap();
        assert_eq!(index.units_per_em(), test_data::UPEM);
        let ranges: Vec<_> = index
            .ranges()
            .iter()
            .map(|r| (r.index, r.start.to_u32(), r.end.to_u32()))
            .collect();
        assert_eq!(
            ranges,
            [(0, 5, 6), (1, 12, 12), (2, 20, 21), (3, 20, 20), (4, 30, 31), (5, 40, 40)]
        );
        assert_eq!(index.ranges()[1].text().unwrap(), test_data::SCALED_DOC);
    }

    #[test]
    fn sorted_by_start() {
        let font_data = test_data::svg_font(1000, &[(10, 12, "<svg/>"), (1, 3, "<svg/>")]);
        let font = FontRef::new(&font_data).unwrap();
        let index = SvgDocumentIndex::new(&font).unwrap();
        assert_eq!(index.ranges()[0].index, 1);
        assert_eq!(index.ranges()[1].index, 0);
        let DocumentMatch::One(range) = index.lookup(GlyphId::new(11)) else {
            panic!("expected a single match");
        };
        assert_eq!(range.index, 0);
    }

    #[test]
    fn zero_one_many() {
        let font_data = test_data::sample_font();
        let font = FontRef::new(&font_data).unwrap();
        let index = SvgDocumentIndex::new(&font).unwrap();
        assert_eq!(index.lookup(GlyphId::new(4)), DocumentMatch::None);
        assert_eq!(index.lookup(GlyphId::new(99)), DocumentMatch::None);
        assert!(matches!(
            index.lookup(GlyphId::new(6)),
            DocumentMatch::One(DocumentRange { index: 0, .. })
        ));
        assert!(matches!(
            index.lookup(GlyphId::new(21)),
            DocumentMatch::One(DocumentRange { index: 2, .. })
        ));
        assert_eq!(index.lookup(GlyphId::new(20)), DocumentMatch::Many(2));
    }

    #[test]
    fn empty_document_list() {
        let font_data = test_data::svg_font(1000, &[]);
        let font = FontRef::new(&font_data).unwrap();
        // an empty list is fine, every lookup misses
        let index = SvgDocumentIndex::new(&font).unwrap();
        assert_eq!(index.lookup(GlyphId::new(0)), DocumentMatch::None);
    }

    #[test]
    fn missing_svg_table() {
        let font_data = test_data::sfnt(&[(*b"head", test_data::head_table(1000))]);
        let font = FontRef::new(&font_data).unwrap();
        assert!(matches!(
            SvgDocumentIndex::new(&font),
            Err(Error::MissingTable(tag)) if tag == read_fonts::types::Tag::new(b"SVG ")
        ));
    }

    #[test]
    fn truncated_document() {
        let mut svg = test_data::svg_table(&[(1, 1, b"<svg/>")]);
        svg.truncate(svg.len() - 2);
        let font_data = test_data::sfnt(&[(*b"SVG ", svg), (*b"head", test_data::head_table(1000))]);
        let font = FontRef::new(&font_data).unwrap();
        assert!(matches!(
            SvgDocumentIndex::new(&font),
            Err(Error::Read(ReadError::OutOfBounds))
        ));
    }

    #[test]
    fn compressed_documents_are_rejected() {
        let range = DocumentRange {
            index: 3,
            start: GlyphId::new(1),
            end: GlyphId::new(1),
            data: &[0x1F, 0x8B, 0x08, 0x00],
        };
        assert!(matches!(range.text(), Err(Error::CompressedDocument(3))));
    }
}
