use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::resource::{Required, Resource};

fn joined(values: &[String]) -> String {
    values.join(", ")
}

// --- Publications ---

/// Journal
///
/// A journal article. `ranking` is free text (e.g. "Q1", "SCI").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Journal {
    pub title: String,
    pub authors: Vec<String>,
    pub journal: String,
    pub volume: String,
    pub issue: String,
    pub pages: String,
    pub year: String,
    pub ranking: String,
    pub link: String,
}

impl Resource for Journal {
    const NAME: &'static str = "Journal";
    const COLLECTION: &'static str = "journals";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("title", &self.title)
            .list("authors", &self.authors)
            .text("journal", &self.journal)
            .text("year", &self.year)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("authors", joined(&self.authors)),
            ("journal", self.journal.clone()),
            ("year", self.year.clone()),
            ("ranking", self.ranking.clone()),
        ]
    }

    fn category(&self) -> Option<String> {
        Some(self.ranking.clone()).filter(|r| !r.is_empty())
    }
}

/// Conference
///
/// A conference paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Conference {
    pub title: String,
    pub authors: Vec<String>,
    pub conference: String,
    pub location: String,
    pub date: Option<NaiveDate>,
    pub year: String,
    pub ranking: String,
    pub link: String,
}

impl Resource for Conference {
    const NAME: &'static str = "Conference";
    const COLLECTION: &'static str = "conferences";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("title", &self.title)
            .list("authors", &self.authors)
            .text("conference", &self.conference)
            .text("year", &self.year)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("authors", joined(&self.authors)),
            ("conference", self.conference.clone()),
            ("location", self.location.clone()),
            ("year", self.year.clone()),
        ]
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Patent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Patent {
    pub title: String,
    pub inventors: Vec<String>,
    pub patent_number: String,
    // "Filed", "Published", "Granted", ...
    pub status: String,
    pub date: Option<NaiveDate>,
    pub link: String,
}

impl Resource for Patent {
    const NAME: &'static str = "Patent";
    const COLLECTION: &'static str = "patents";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("title", &self.title)
            .list("inventors", &self.inventors)
            .text("patent_number", &self.patent_number)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("inventors", joined(&self.inventors)),
            ("patent_number", self.patent_number.clone()),
            ("status", self.status.clone()),
        ]
    }

    fn category(&self) -> Option<String> {
        Some(self.status.clone()).filter(|s| !s.is_empty())
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Book
///
/// A book or a book chapter, distinguished by `kind`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Book {
    pub title: String,
    pub authors: Vec<String>,
    pub publisher: String,
    pub isbn: String,
    pub year: String,
    pub kind: String,
    pub link: String,
}

impl Resource for Book {
    const NAME: &'static str = "Book";
    const COLLECTION: &'static str = "books";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("title", &self.title)
            .list("authors", &self.authors)
            .text("publisher", &self.publisher)
            .text("year", &self.year)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("authors", joined(&self.authors)),
            ("publisher", self.publisher.clone()),
            ("year", self.year.clone()),
        ]
    }

    fn category(&self) -> Option<String> {
        Some(self.kind.clone()).filter(|k| !k.is_empty())
    }
}

/// Workshop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Workshop {
    pub title: String,
    pub authors: Vec<String>,
    pub workshop: String,
    pub location: String,
    pub date: Option<NaiveDate>,
    pub year: String,
    pub link: String,
}

impl Resource for Workshop {
    const NAME: &'static str = "Workshop";
    const COLLECTION: &'static str = "workshops";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("title", &self.title)
            .text("year", &self.year)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("authors", joined(&self.authors)),
            ("workshop", self.workshop.clone()),
            ("location", self.location.clone()),
            ("year", self.year.clone()),
        ]
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

// --- People ---

/// Contact
///
/// Contact details owned by a person record; no identity of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Contact {
    pub email: String,
    pub phone: String,
    pub website: String,
    pub linkedin: String,
}

/// Degree
///
/// Programme a student is enrolled in. Drives the students page tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Degree {
    PhD,
    MTech,
    BTech,
}

impl Degree {
    pub fn as_str(&self) -> &'static str {
        match self {
            Degree::PhD => "PhD",
            Degree::MTech => "MTech",
            Degree::BTech => "BTech",
        }
    }
}

/// Student
///
/// A PhD, M.Tech or B.Tech student. `status` is free text ("Current", "Alumni").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Student {
    pub name: String,
    pub degree: Option<Degree>,
    pub research_area: String,
    pub batch: String,
    pub status: String,
    pub image: String,
    pub contact: Option<Contact>,
}

impl Resource for Student {
    const NAME: &'static str = "Student";
    const COLLECTION: &'static str = "students";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("name", &self.name)
            .present("degree", &self.degree)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("research_area", self.research_area.clone()),
            ("batch", self.batch.clone()),
            (
                "email",
                self.contact
                    .as_ref()
                    .map(|c| c.email.clone())
                    .unwrap_or_default(),
            ),
        ]
    }

    fn category(&self) -> Option<String> {
        self.degree.map(|d| d.as_str().to_string())
    }
}

/// Intern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Intern {
    pub name: String,
    pub institute: String,
    pub project: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub contact: Option<Contact>,
}

impl Resource for Intern {
    const NAME: &'static str = "Intern";
    const COLLECTION: &'static str = "interns";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("name", &self.name)
            .text("institute", &self.institute)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("institute", self.institute.clone()),
            ("project", self.project.clone()),
        ]
    }

    fn date(&self) -> Option<NaiveDate> {
        self.start_date
    }
}

// --- Lab life ---

/// News
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct News {
    pub title: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub link: String,
}

impl Resource for News {
    const NAME: &'static str = "News";
    const COLLECTION: &'static str = "news";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("title", &self.title)
            .present("date", &self.date)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("description", self.description.clone()),
        ]
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Event
///
/// A talk, seminar or workshop hosted by the lab. `event_type` drives the events tabs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Event {
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_type: String,
    pub date: Option<NaiveDate>,
    pub year: String,
    pub image: String,
}

impl Resource for Event {
    const NAME: &'static str = "Event";
    const COLLECTION: &'static str = "events";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("title", &self.title)
            .present("date", &self.date)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("description", self.description.clone()),
            ("location", self.location.clone()),
            ("year", self.year.clone()),
        ]
    }

    fn category(&self) -> Option<String> {
        Some(self.event_type.clone()).filter(|t| !t.is_empty())
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Gallery
///
/// A gallery image. `image` holds the object key returned by the upload endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Gallery {
    pub title: String,
    pub image: String,
    pub caption: String,
    pub date: Option<NaiveDate>,
}

impl Resource for Gallery {
    const NAME: &'static str = "Gallery";
    const COLLECTION: &'static str = "gallery";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("title", &self.title)
            .text("image", &self.image)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("caption", self.caption.clone()),
        ]
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Course
///
/// One course taught in a semester; owned by its `Teaching` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub role: String,
}

/// Teaching
///
/// The courses taught in one semester.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Teaching {
    pub semester: String,
    pub year: String,
    pub courses: Vec<Course>,
}

impl Resource for Teaching {
    const NAME: &'static str = "Teaching";
    const COLLECTION: &'static str = "teaching";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new()
            .text("semester", &self.semester)
            .text("year", &self.year)
            .finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        let courses = self
            .courses
            .iter()
            .map(|c| format!("{} {}", c.code, c.name))
            .collect::<Vec<_>>();
        vec![
            ("semester", self.semester.clone()),
            ("year", self.year.clone()),
            ("courses", joined(&courses)),
        ]
    }
}

/// Activity
///
/// Outreach, talks given, committee work and similar entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct Activity {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: Option<NaiveDate>,
}

impl Resource for Activity {
    const NAME: &'static str = "Activity";
    const COLLECTION: &'static str = "activities";

    fn missing_fields(&self) -> Vec<&'static str> {
        Required::new().text("title", &self.title).finish()
    }

    fn search_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("description", self.description.clone()),
            ("category", self.category.clone()),
        ]
    }

    fn category(&self) -> Option<String> {
        Some(self.category.clone()).filter(|c| !c.is_empty())
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

// --- Wire Schemas ---

/// GalleryUploadRequest
///
/// Input payload for requesting a presigned gallery image upload URL.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct GalleryUploadRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "group_photo.jpg")]
    pub filename: String,
    /// The MIME type; must be an `image/*` type.
    #[schema(example = "image/jpeg")]
    pub file_type: String,
}

/// GalleryUploadResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct GalleryUploadResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// Object key to store in `Gallery.image`.
    pub resource_key: String,
}

/// DataEnvelope
///
/// Success envelope used by every endpoint returning documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// ListEnvelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for ListEnvelope<T> {
    fn from(data: Vec<T>) -> Self {
        let total = data.len();
        Self { data, total }
    }
}

/// MessageResponse
///
/// Body of every error and of plain acknowledgements.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
