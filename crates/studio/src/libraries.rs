//! CDN libraries that can be dropped into an HTML document.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Library {
    pub key: &'static str,
    pub name: &'static str,
    /// Tags inserted into the document, one per line.
    pub tags: &'static str,
}

pub const LIBRARIES: &[Library] = &[
    Library {
        key: "bootstrap",
        name: "Bootstrap 5",
        tags: "<link href=\"https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css\" rel=\"stylesheet\">\n<script src=\"https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/js/bootstrap.bundle.min.js\"></script>",
    },
    Library {
        key: "tailwind",
        name: "Tailwind CSS",
        tags: "<script src=\"https://cdn.tailwindcss.com\"></script>",
    },
    Library {
        key: "jquery",
        name: "jQuery",
        tags: "<script src=\"https://code.jquery.com/jquery-3.7.1.min.js\"></script>",
    },
    Library {
        key: "vue",
        name: "Vue.js 3",
        tags: "<script src=\"https://unpkg.com/vue@3/dist/vue.global.js\"></script>",
    },
    Library {
        key: "react",
        name: "React + ReactDOM",
        tags: "<script src=\"https://unpkg.com/react@18/umd/react.development.js\"></script>\n<script src=\"https://unpkg.com/react-dom@18/umd/react-dom.development.js\"></script>",
    },
    Library {
        key: "p5",
        name: "p5.js",
        tags: "<script src=\"https://cdn.jsdelivr.net/npm/p5@1.9.0/lib/p5.min.js\"></script>",
    },
    Library {
        key: "anime",
        name: "Anime.js",
        tags: "<script src=\"https://cdn.jsdelivr.net/npm/animejs@3.2.2/lib/anime.min.js\"></script>",
    },
    Library {
        key: "gsap",
        name: "GSAP",
        tags: "<script src=\"https://cdn.jsdelivr.net/npm/gsap@3.12.4/dist/gsap.min.js\"></script>",
    },
    Library {
        key: "chartjs",
        name: "Chart.js",
        tags: "<script src=\"https://cdn.jsdelivr.net/npm/chart.js\"></script>",
    },
    Library {
        key: "aframe",
        name: "A-Frame",
        tags: "<script src=\"https://aframe.io/releases/1.5.0/aframe.min.js\"></script>",
    },
];

pub fn find_library(key: &str) -> Option<&'static Library> {
    let key = key.trim();
    LIBRARIES
        .iter()
        .find(|lib| lib.key.eq_ignore_ascii_case(key))
}

fn indented(tags: &str) -> String {
    tags.lines()
        .map(|line| format!("    {}\n", line))
        .collect()
}

/// Insert the library's tags into `document`.
///
/// Placement, first match wins: just before `</head>`, just after `<head>`,
/// in a new head right after `<html>`, otherwise prepended. Only the first
/// occurrence of the anchor is touched.
pub fn insert_library(document: &str, library: &Library) -> String {
    let block = indented(library.tags);
    if document.contains("</head>") {
        document.replacen("</head>", &format!("{}</head>", block), 1)
    } else if document.contains("<head>") {
        document.replacen("<head>", &format!("<head>\n{}", block.trim_end_matches('\n')), 1)
    } else if document.contains("<html>") {
        document.replacen("<html>", &format!("<html>\n<head>\n{}</head>", block), 1)
    } else {
        format!("{}\n{}", library.tags, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jquery() -> &'static Library {
        find_library("jquery").unwrap()
    }

    #[test]
    fn test_inserts_before_closing_head() {
        let doc = "<html>\n<head>\n    <title>x</title>\n</head>\n<body></body>\n</html>";
        let out = insert_library(doc, jquery());
        assert_eq!(
            out,
            "<html>\n<head>\n    <title>x</title>\n    <script src=\"https://code.jquery.com/jquery-3.7.1.min.js\"></script>\n</head>\n<body></body>\n</html>"
        );
    }

    #[test]
    fn test_inserts_after_open_head_when_unclosed() {
        let out = insert_library("<head>\n<title>x</title>", jquery());
        assert!(out.starts_with("<head>\n    <script src=\"https://code.jquery.com/"));
        assert!(out.ends_with("</script>\n<title>x</title>"));
    }

    #[test]
    fn test_creates_head_inside_html() {
        let out = insert_library("<html>\n<body>hi</body>\n</html>", jquery());
        assert!(out.starts_with("<html>\n<head>\n    <script"));
        assert!(out.contains("</script>\n</head>\n<body>hi</body>"));
    }

    #[test]
    fn test_prepends_to_fragments() {
        let out = insert_library("<div>hi</div>", jquery());
        assert_eq!(out, format!("{}\n<div>hi</div>", jquery().tags));
    }

    #[test]
    fn test_multi_tag_libraries_indent_every_line() {
        let react = find_library("REACT").unwrap();
        let out = insert_library("<head></head>", react);
        assert_eq!(out.matches("    <script src=\"https://unpkg.com/react").count(), 2);
        assert!(out.starts_with("<head>    <script"));
        assert!(out.ends_with("</script>\n</head>"));
    }

    #[test]
    fn test_unknown_library() {
        assert!(find_library("leftpad").is_none());
        assert_eq!(LIBRARIES.len(), 10);
    }
}
