//! 텍스트 인코딩 (FileRead / FileWrite 공용)

use toolgate_foundation::{Error, Result};

/// 지원 인코딩
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    /// 인코딩 이름 파싱 (대소문자 무시, `None`이면 UTF-8)
    pub fn parse(name: Option<&str>) -> Result<Self> {
        let Some(name) = name else {
            return Ok(Self::Utf8);
        };
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Self::Latin1),
            other => Err(Error::InvalidInput(format!(
                "Unsupported encoding: {} (expected utf-8, ascii or latin-1)",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin-1",
        }
    }

    /// bytes → 문자열 (실패 시 IO_ERROR)
    pub fn decode(&self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).map_err(|e| {
                Error::Storage(format!(
                    "Content is not valid utf-8 at byte {}",
                    e.utf8_error().valid_up_to()
                ))
            }),
            Self::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(Error::Storage(format!(
                    "Content is not valid ascii at byte {}",
                    pos
                ))),
                None => Ok(bytes.into_iter().map(char::from).collect()),
            },
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }

    /// 문자열 → bytes (표현할 수 없는 문자는 IO_ERROR)
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let limit = match self {
            Self::Utf8 => return Ok(text.as_bytes().to_vec()),
            Self::Ascii => 0x7F,
            Self::Latin1 => 0xFF,
        };
        text.chars()
            .map(|c| {
                u8::try_from(c)
                    .ok()
                    .filter(|b| u32::from(*b) <= limit)
                    .ok_or_else(|| {
                        Error::Storage(format!(
                            "Character {:?} cannot be encoded as {}",
                            c,
                            self.as_str()
                        ))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolgate_foundation::ErrorKind;

    #[test]
    fn test_parse() {
        assert_eq!(TextEncoding::parse(None).unwrap(), TextEncoding::Utf8);
        assert_eq!(TextEncoding::parse(Some("UTF-8")).unwrap(), TextEncoding::Utf8);
        assert_eq!(TextEncoding::parse(Some("latin_1")).unwrap(), TextEncoding::Latin1);
        let err = TextEncoding::parse(Some("ebcdic")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_decode_errors_are_io() {
        let err = TextEncoding::Utf8.decode(vec![0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoError);
        let err = TextEncoding::Ascii.decode("é".as_bytes().to_vec()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoError);
    }

    #[test]
    fn test_latin1() {
        assert_eq!(TextEncoding::Latin1.decode(vec![0xe9]).unwrap(), "é");
        assert_eq!(TextEncoding::Latin1.encode("é").unwrap(), vec![0xe9]);
        assert!(TextEncoding::Latin1.encode("한").is_err());
        assert!(TextEncoding::Ascii.encode("é").is_err());
    }
}
