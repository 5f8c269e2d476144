use serde::Serialize;
use std::fmt;

/// Destination folder for an organized file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Images,
    Documents,
    Subtitles,
    Archives,
    Installers,
    Media,
    Other,
}

impl Category {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" => Category::Images,

            "pdf" | "doc" | "docx" | "txt" | "ppt" | "pptx" | "xls" | "xlsx" => {
                Category::Documents
            }

            "srt" | "ass" | "sub" | "vtt" | "ssa" => Category::Subtitles,

            "zip" | "rar" | "7z" => Category::Archives,

            "exe" | "msi" => Category::Installers,

            "mp4" | "mov" | "mp3" | "wav" => Category::Media,

            _ => Category::Other,
        }
    }

    /// Name of the subfolder created inside the organized directory
    pub fn folder_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Documents => "Documents",
            Category::Subtitles => "Subtitles",
            Category::Archives => "Archives",
            Category::Installers => "Installers",
            Category::Media => "Media",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.folder_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_extension() {
        assert_eq!(Category::from_extension("png"), Category::Images);
        assert_eq!(Category::from_extension("jpeg"), Category::Images);
        assert_eq!(Category::from_extension("docx"), Category::Documents);
        assert_eq!(Category::from_extension("txt"), Category::Documents);
        assert_eq!(Category::from_extension("srt"), Category::Subtitles);
        assert_eq!(Category::from_extension("7z"), Category::Archives);
        assert_eq!(Category::from_extension("msi"), Category::Installers);
        assert_eq!(Category::from_extension("mp3"), Category::Media);
    }

    #[test]
    fn test_category_case_insensitive() {
        assert_eq!(Category::from_extension("PNG"), Category::Images);
        assert_eq!(Category::from_extension("Pdf"), Category::Documents);
        assert_eq!(Category::from_extension("MOV"), Category::Media);
    }

    #[test]
    fn test_unknown_extension_is_other() {
        assert_eq!(Category::from_extension("xyz"), Category::Other);
        assert_eq!(Category::from_extension("rs"), Category::Other);
    }

    #[test]
    fn test_folder_names_are_distinct() {
        let all = [
            Category::Images,
            Category::Documents,
            Category::Subtitles,
            Category::Archives,
            Category::Installers,
            Category::Media,
            Category::Other,
        ];
        let mut names: Vec<_> = all.iter().map(|c| c.folder_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }
}
