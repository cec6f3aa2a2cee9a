use chrono::{NaiveDate, Utc};
use helix_admin::domain::api_usage::{ApiUsageFilter, ApiUsageHit};
use helix_admin::domain::communication::{CommunicationFilter, Medium, NewCommunication};
use helix_admin::domain::contact::{ContactFilter, NewContact};
use helix_admin::domain::event::{CrisisType, EventFilter, NewEvent};
use helix_admin::domain::extraction::{ExtractionQueryFilter, NewExtractionQuery};
use helix_admin::domain::report::{NewReport, ReportFilter, ReportSignOff};
use helix_admin::domain::types::{
    ApiType, ClientCode, ContactEmail, ContactName, CountryCode, EventName, QueryName, ReportName,
    Subject,
};
use helix_admin::list::variables::Ordering;
use helix_admin::repository::errors::RepositoryError;
use helix_admin::repository::{
    ApiUsageReader, ApiUsageWriter, CommunicationReader, CommunicationWriter, ContactReader,
    ContactWriter, DieselRepository, EventReader, EventWriter, ExtractionQueryReader,
    ExtractionQueryWriter, ListQuery, ReportReader, ReportWriter,
};

mod common;

fn contact(name: &str, email: &str, country: &str) -> NewContact {
    NewContact {
        name: ContactName::new(name).unwrap(),
        email: Some(ContactEmail::new(email).unwrap()),
        phone: None,
        organization: Some("UNHCR".into()),
        country: Some(CountryCode::new(country).unwrap()),
        job_title: None,
    }
}

fn event(name: &str, crisis_type: CrisisType, country: &str, start: &str) -> NewEvent {
    NewEvent {
        name: EventName::new(name).unwrap(),
        crisis_type,
        violence_subtype: None,
        country: CountryCode::new(country).unwrap(),
        start_date: start.parse().unwrap(),
        end_date: None,
    }
}

#[test]
fn test_contact_repository_crud() {
    let test_db = common::TestDb::new("test_contact_repository_crud.db");
    let repo = DieselRepository::new(test_db.pool());

    let alice = repo
        .create_contact(&contact("Alice", "alice@example.org", "NPL"))
        .unwrap();
    let bob = repo
        .create_contact(&contact("Bob", "bob@example.org", "SDN"))
        .unwrap();

    let by_name = ListQuery::new(ContactFilter::default()).order(Ordering::asc("name"));
    let (total, items) = repo.list_contacts(&by_name).unwrap();
    assert_eq!(total, 2);
    assert_eq!(items[0].name.as_str(), "Alice");

    let search = ListQuery::new(ContactFilter {
        search: "bob".into(),
        ..ContactFilter::default()
    });
    let (total, items) = repo.list_contacts(&search).unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].id, bob.id);

    assert_eq!(repo.list_contact_countries().unwrap(), vec!["NPL", "SDN"]);

    let mut changes = contact("Bobby", "bob@example.org", "SDN");
    changes.job_title = Some("Analyst".into());
    let updated = repo.update_contact(bob.id, &changes).unwrap();
    assert_eq!(updated.name.as_str(), "Bobby");
    assert_eq!(updated.job_title.as_deref(), Some("Analyst"));

    repo.delete_contact(alice.id).unwrap();
    assert!(repo.get_contact_by_id(alice.id).unwrap().is_none());
    assert!(matches!(
        repo.delete_contact(alice.id),
        Err(RepositoryError::NotFound)
    ));
}

#[test]
fn test_duplicate_contact_email_is_a_conflict() {
    let test_db = common::TestDb::new("test_duplicate_contact_email_is_a_conflict.db");
    let repo = DieselRepository::new(test_db.pool());

    repo.create_contact(&contact("Alice", "alice@example.org", "NPL"))
        .unwrap();
    let duplicate = repo.create_contact(&contact("Alicia", "alice@example.org", "NPL"));

    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
}

#[test]
fn test_communications_stay_with_their_contact() {
    let test_db = common::TestDb::new("test_communications_stay_with_their_contact.db");
    let repo = DieselRepository::new(test_db.pool());
    let alice = repo
        .create_contact(&contact("Alice", "alice@example.org", "NPL"))
        .unwrap();
    let bob = repo
        .create_contact(&contact("Bob", "bob@example.org", "SDN"))
        .unwrap();

    let history = [
        (alice.id, "Intro", 1),
        (alice.id, "Follow up", 5),
        (bob.id, "Hello", 3),
    ];
    for (contact_id, subject, day) in history {
        repo.create_communication(&NewCommunication {
            contact_id,
            subject: Subject::new(subject).unwrap(),
            medium: Medium::Email,
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            content: None,
        })
        .unwrap();
    }

    let query =
        ListQuery::new(CommunicationFilter::for_contact(alice.id)).order(Ordering::desc("date"));
    let (total, items) = repo.list_communications(&query).unwrap();
    assert_eq!(total, 2);
    assert_eq!(items[0].subject.as_str(), "Follow up");

    repo.delete_contact(alice.id).unwrap();
    let (total, _) = repo.list_communications(&query).unwrap();
    assert_eq!(total, 0);
}

#[test]
fn test_event_filters_and_paging() {
    let test_db = common::TestDb::new("test_event_filters_and_paging.db");
    let repo = DieselRepository::new(test_db.pool());

    repo.create_event(&event("Floods", CrisisType::Disaster, "NPL", "2024-07-01"))
        .unwrap();
    repo.create_event(&event("Clashes", CrisisType::Conflict, "SDN", "2024-04-15"))
        .unwrap();
    repo.create_event(&event("Landslide", CrisisType::Disaster, "NPL", "2023-09-10"))
        .unwrap();

    let disasters = EventFilter {
        crisis_types: vec!["disaster".into()],
        ..EventFilter::default()
    };
    let (total, items) = repo
        .list_events(&ListQuery::new(disasters).order(Ordering::asc("start_date")))
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(items[0].name.as_str(), "Landslide");

    let in_2024 = EventFilter {
        date_from: "2024-01-01".into(),
        ..EventFilter::default()
    };
    let (total, _) = repo.list_events(&ListQuery::new(in_2024)).unwrap();
    assert_eq!(total, 2);

    let second_page = ListQuery::new(EventFilter::default())
        .order(Ordering::desc("start_date"))
        .paginate(2, 2);
    let (total, items) = repo.list_events(&second_page).unwrap();
    assert_eq!(total, 3);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name.as_str(), "Landslide");

    assert_eq!(repo.list_event_countries().unwrap(), vec!["NPL", "SDN"]);
}

#[test]
fn test_extraction_queries_keep_their_filters() {
    let test_db = common::TestDb::new("test_extraction_queries_keep_their_filters.db");
    let repo = DieselRepository::new(test_db.pool());
    let filters = EventFilter {
        countries: vec!["NPL".into()],
        date_from: "2024-01-01".into(),
        ..EventFilter::default()
    };

    let saved = repo
        .create_extraction_query(&NewExtractionQuery {
            name: QueryName::new("Nepal 2024").unwrap(),
            filters: filters.clone(),
        })
        .unwrap();
    let stored = repo.get_extraction_query_by_id(saved.id).unwrap().unwrap();
    assert_eq!(stored.filters, filters);

    let duplicate = repo.create_extraction_query(&NewExtractionQuery {
        name: QueryName::new("Nepal 2024").unwrap(),
        filters: EventFilter::default(),
    });
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

    let (total, _) = repo
        .list_extraction_queries(&ListQuery::new(ExtractionQueryFilter::default()))
        .unwrap();
    assert_eq!(total, 1);

    repo.delete_extraction_query(saved.id).unwrap();
    assert!(repo.get_extraction_query_by_id(saved.id).unwrap().is_none());
}

#[test]
fn test_report_is_signed_off_once() {
    let test_db = common::TestDb::new("test_report_is_signed_off_once.db");
    let repo = DieselRepository::new(test_db.pool());
    let floods = repo
        .create_event(&event("Floods", CrisisType::Disaster, "NPL", "2024-07-01"))
        .unwrap();
    let report = repo
        .create_report(&NewReport {
            name: ReportName::new("Monsoon update").unwrap(),
            description: None,
            event_id: Some(floods.id),
        })
        .unwrap();
    assert!(!report.is_signed_off);

    let sign_off = ReportSignOff {
        signed_off_by: "lead@example.org".into(),
        signed_off_at: Utc::now().naive_utc(),
    };
    let signed = repo.sign_off_report(report.id, &sign_off).unwrap();
    assert!(signed.is_signed_off);
    assert_eq!(signed.signed_off_by.as_deref(), Some("lead@example.org"));

    assert!(matches!(
        repo.sign_off_report(report.id, &sign_off),
        Err(RepositoryError::ConstraintViolation(_))
    ));

    let pending = ReportFilter {
        signed_off: "no".into(),
        ..ReportFilter::default()
    };
    let (total, _) = repo.list_reports(&ListQuery::new(pending)).unwrap();
    assert_eq!(total, 0);

    let of_event = ReportFilter {
        event_id: Some(floods.id.get()),
        ..ReportFilter::default()
    };
    let (total, _) = repo.list_reports(&ListQuery::new(of_event)).unwrap();
    assert_eq!(total, 1);
}

#[test]
fn test_api_usage_counts_requests_per_day() {
    let test_db = common::TestDb::new("test_api_usage_counts_requests_per_day.db");
    let repo = DieselRepository::new(test_db.pool());
    let hit = ApiUsageHit {
        client_code: ClientCode::new("partner-1").unwrap(),
        api_type: ApiType::new("contacts").unwrap(),
        usage_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
    };

    repo.record_api_usage(&hit).unwrap();
    let usage = repo.record_api_usage(&hit).unwrap();
    assert_eq!(usage.requests, 2);

    let next_day = ApiUsageHit {
        usage_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        ..hit
    };
    repo.record_api_usage(&next_day).unwrap();

    let (total, _) = repo
        .list_api_usage(&ListQuery::new(ApiUsageFilter::default()))
        .unwrap();
    assert_eq!(total, 2);
}
