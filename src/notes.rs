use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credits {
    pub lecture: u8,
    pub tutorial: u8,
    pub practical: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseNotes {
    pub title: &'static str,
    pub code: &'static str,
    pub credits: Credits,
    /// `None` while the notes folder is not published yet.
    pub link: Option<&'static str>,
    pub other_link: &'static str,
    pub tag: Option<&'static str>,
    pub extra: Option<&'static str>,
}

impl CourseNotes {
    pub fn description(&self) -> String {
        format!(
            "({}:{}:{}) {}",
            self.credits.lecture, self.credits.tutorial, self.credits.practical, self.code
        )
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag
            .is_some_and(|own| own.eq_ignore_ascii_case(tag.trim()))
    }
}

const fn credits(lecture: u8, tutorial: u8, practical: u8) -> Credits {
    Credits {
        lecture,
        tutorial,
        practical,
    }
}

const OTHER_LINKS: &str = "/links";
const GITHUB_REPO: Option<&str> = Some("This is github repository");

/// Third semester CSE (AI & ML) notes.
pub const CSE_AIML_NOTES: [CourseNotes; 10] = [
    CourseNotes {
        title: "Linear Algebra & Integral Transforms",
        code: "CI31",
        credits: credits(2, 1, 0),
        link: Some("https://drive.google.com/drive/folders/1d126yrfEwfL1QqEL9cJcl3SHP6skil0G?usp=share_link"),
        other_link: OTHER_LINKS,
        tag: None,
        extra: None,
    },
    CourseNotes {
        title: "Data Base Management Systems",
        code: "CI32",
        credits: credits(3, 0, 0),
        link: Some("https://drive.google.com/drive/folders/1Jp1yODvx1-EO5SywKVLxsVdsqLYAf_d7?usp=share_link"),
        other_link: OTHER_LINKS,
        tag: Some("SQL"),
        extra: None,
    },
    CourseNotes {
        title: "Data Structures",
        code: "CI33",
        credits: credits(3, 0, 0),
        link: Some("https://drive.google.com/drive/folders/1xKwDfh47KlX5yOFw_zPK7gHJwnd64gIC?usp=share_link"),
        other_link: OTHER_LINKS,
        tag: Some("C Programming"),
        extra: None,
    },
    CourseNotes {
        title: "Computer organization and Architecture",
        code: "CI34",
        credits: credits(3, 0, 0),
        link: Some("https://drive.google.com/drive/folders/1sGeLN9AV2mPm3CxNCz8Ws9u0nwHNY33k?usp=share_link"),
        other_link: OTHER_LINKS,
        tag: None,
        extra: None,
    },
    CourseNotes {
        title: "Discrete Mathematical Structures",
        code: "CI35",
        credits: credits(2, 1, 0),
        link: Some("https://drive.google.com/drive/folders/1UjfYJyCRSz8KtQeWxnypGEz9q1uIBbSs?usp=share_link"),
        other_link: OTHER_LINKS,
        tag: None,
        extra: None,
    },
    CourseNotes {
        title: "Data Structures Laboratory",
        code: "CIL36",
        credits: credits(0, 0, 1),
        link: Some("https://github.com/githubhosting/DS_Lab_c-programming_Personal"),
        other_link: "https://github.com/githubhosting/DS_Lab_c-programming",
        tag: Some("C Programming"),
        extra: GITHUB_REPO,
    },
    CourseNotes {
        title: "OOPS Laboratory",
        code: "CIL37",
        credits: credits(0, 0, 1),
        link: Some("https://github.com/githubhosting/OOPS_Lab_CPP"),
        other_link: OTHER_LINKS,
        tag: Some("C++"),
        extra: GITHUB_REPO,
    },
    CourseNotes {
        title: "Universal Human Value Course",
        code: "UHV38",
        credits: credits(2, 0, 0),
        link: Some("https://drive.google.com/drive/folders/1i6_X176UpyXi_aufwXyWcLiHVgpD6yEz?usp=sharing"),
        other_link: OTHER_LINKS,
        tag: None,
        extra: None,
    },
    CourseNotes {
        title: "Kannada (Kali / Manasu)",
        code: "HS391/491",
        credits: credits(1, 0, 0),
        link: Some("https://drive.google.com/drive/folders/1MIXAORMZ0GYUFJqYDjsYZbKYEnv8Rgch?usp=share_link"),
        other_link: OTHER_LINKS,
        tag: Some("Language"),
        extra: None,
    },
    CourseNotes {
        title: "Ability Enhancement Course-III",
        code: "AEC310",
        credits: credits(1, 0, 0),
        link: None,
        other_link: OTHER_LINKS,
        tag: None,
        extra: None,
    },
];

pub fn filter_by_tag<'a>(notes: &'a [CourseNotes], tag: Option<&str>) -> Vec<&'a CourseNotes> {
    notes
        .iter()
        .filter(|note| tag.map_or(true, |tag| note.has_tag(tag)))
        .collect()
}

pub fn tags(notes: &[CourseNotes]) -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = notes.iter().filter_map(|note| note.tag).collect();
    tags.sort_unstable();
    tags.dedup();
    tags
}

pub fn render_notes(notes: &[&CourseNotes]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Course Notes");
    if notes.is_empty() {
        let _ = writeln!(output, "No notes match this tag.");
        return output;
    }

    for note in notes.iter() {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {}", note.title);
        let _ = writeln!(output, "{}", note.description());
        let _ = writeln!(output, "- View: {}", note.link.unwrap_or("not published yet"));
        let _ = writeln!(output, "- Other links: {}", note.other_link);
        if let Some(extra) = note.extra {
            let _ = writeln!(output, "- {extra}");
        }
        if let Some(tag) = note.tag {
            let _ = writeln!(output, "- Tag: {tag}");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_shows_credits_and_code() {
        assert_eq!(CSE_AIML_NOTES[0].description(), "(2:1:0) CI31");
        assert_eq!(CSE_AIML_NOTES[5].description(), "(0:0:1) CIL36");
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<&str> = CSE_AIML_NOTES.iter().map(|note| note.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), CSE_AIML_NOTES.len());
    }

    #[test]
    fn tag_filter_ignores_case() {
        let matches = filter_by_tag(&CSE_AIML_NOTES, Some("c programming"));
        let codes: Vec<&str> = matches.iter().map(|note| note.code).collect();
        assert_eq!(codes, vec!["CI33", "CIL36"]);

        assert_eq!(filter_by_tag(&CSE_AIML_NOTES, None).len(), 10);
        assert!(filter_by_tag(&CSE_AIML_NOTES, Some("Rust")).is_empty());
    }

    #[test]
    fn tags_are_listed_once() {
        assert_eq!(
            tags(&CSE_AIML_NOTES),
            vec!["C Programming", "C++", "Language", "SQL"]
        );
    }

    #[test]
    fn render_marks_unpublished_notes() {
        let all = filter_by_tag(&CSE_AIML_NOTES, None);
        let text = render_notes(&all);
        assert!(text.contains("### Ability Enhancement Course-III"));
        assert!(text.contains("- View: not published yet"));
        assert!(text.contains("- This is github repository"));
        assert!(text.contains("- Tag: SQL"));
    }

    #[test]
    fn render_reports_empty_filter() {
        assert!(render_notes(&[]).contains("No notes match this tag."));
    }
}
