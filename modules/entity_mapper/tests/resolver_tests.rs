//! Integration tests for relationship resolution

mod common;

use common::{Address, ContactInfo, MockRepo, User};
use entity_mapper::{
    Config, DbValue, Entity, MappingError, Point, RelationField, RelationshipRegistry,
    RelationshipResolver,
};
use std::sync::Arc;

struct Fixture {
    contacts: Arc<MockRepo<ContactInfo>>,
    addresses: Arc<MockRepo<Address>>,
    users: Arc<MockRepo<User>>,
    resolver: RelationshipResolver,
}

fn fixture_with(
    contacts: MockRepo<ContactInfo>,
    addresses: MockRepo<Address>,
    config: &Config,
) -> Fixture {
    let contacts = Arc::new(contacts);
    let addresses = Arc::new(addresses);
    let users = Arc::new(MockRepo::new());

    let registry = RelationshipRegistry::builder()
        .has_many::<User, ContactInfo>("contacts", "user_id", contacts.clone(), |u| {
            &mut u.contacts
        })
        .unwrap()
        .has_many::<User, Address>("addresses", "user_id", addresses.clone(), |u| {
            &mut u.addresses
        })
        .unwrap()
        .belongs_to::<ContactInfo, User>(
            "user",
            "user_id",
            users.clone(),
            |c| c.user_id.into(),
            |c| &mut c.user,
        )
        .unwrap()
        .build();

    Fixture {
        contacts,
        addresses,
        users,
        resolver: RelationshipResolver::with_config(Arc::new(registry), config),
    }
}

fn fixture() -> Fixture {
    fixture_with(MockRepo::new(), MockRepo::new(), &Config::default())
}

fn address(id: i64, user_id: i64, x: f64, y: f64) -> Address {
    Address {
        id: Some(id),
        user_id,
        location: Point::new(x, y),
    }
}

#[tokio::test]
async fn test_user_contacts_resolved_in_repository_order() {
    let f = fixture();
    let email = ContactInfo::new(1, 42, "email", "ada@example.com");
    let phone = ContactInfo::new(2, 42, "phone", "+44 20 7946 0000");
    f.contacts.insert(42_i64, email.clone());
    f.contacts.insert(7_i64, ContactInfo::new(3, 7, "email", "bob@example.com"));
    f.contacts.insert(42_i64, phone.clone());

    let mut user = User::new(Some(42), "Ada");
    f.resolver.resolve(&mut user).await.unwrap();

    assert_eq!(user.contacts, RelationField::Resolved(vec![email, phone]));
    assert_eq!(
        f.contacts.calls(),
        vec![("user_id".to_string(), DbValue::I64(42))]
    );
}

#[tokio::test]
async fn test_zero_rows_resolve_to_empty_collection() {
    let f = fixture();
    let mut user = User::new(Some(5), "Eve");

    f.resolver.resolve(&mut user).await.unwrap();

    assert_eq!(user.contacts, RelationField::Resolved(Vec::new()));
    assert_eq!(user.addresses, RelationField::Resolved(Vec::new()));
    assert_eq!(f.contacts.call_count(), 1);
}

#[tokio::test]
async fn test_null_id_skips_lookup() {
    let f = fixture();
    let mut user = User::new(None, "unsaved");

    f.resolver.resolve(&mut user).await.unwrap();

    assert_eq!(user.contacts, RelationField::Resolved(Vec::new()));
    assert_eq!(user.addresses, RelationField::Resolved(Vec::new()));
    assert_eq!(f.contacts.call_count(), 0);
    assert_eq!(f.addresses.call_count(), 0);
}

#[tokio::test]
async fn test_failed_field_does_not_block_the_other() {
    let f = fixture();
    let email = ContactInfo::new(1, 42, "email", "ada@example.com");
    f.contacts.insert(42_i64, email.clone());
    f.addresses.set_failing(true);

    let mut user = User::new(Some(42), "Ada");
    let err = f.resolver.resolve(&mut user).await.unwrap_err();

    match &err {
        MappingError::RelationshipResolution {
            entity_type, field, ..
        } => {
            assert_eq!(*entity_type, "User");
            assert_eq!(*field, "addresses");
        }
        other => panic!("unexpected error: {other}"),
    }
    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("mock repository unavailable"));

    assert_eq!(user.contacts, RelationField::Resolved(vec![email]));
    assert!(!user.addresses.is_resolved());
}

#[tokio::test]
async fn test_resolve_single_field() {
    let f = fixture();
    f.addresses.insert(42_i64, address(1, 42, 1.5, 2.5));

    let mut user = User::new(Some(42), "Ada");
    f.resolver.resolve_field(&mut user, "addresses").await.unwrap();

    assert_eq!(user.addresses.items(), &[address(1, 42, 1.5, 2.5)]);
    assert!(!user.contacts.is_resolved());
    assert_eq!(f.contacts.call_count(), 0);
}

#[tokio::test]
async fn test_resolve_unknown_field() {
    let f = fixture();
    let mut user = User::new(Some(42), "Ada");

    let err = f
        .resolver
        .resolve_field(&mut user, "friends")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MappingError::InvalidDescriptor { entity_type: "User", ref field, .. } if field == "friends"
    ));
}

#[tokio::test]
async fn test_belongs_to_resolves_owner() {
    let f = fixture();
    let ada = User::new(Some(42), "Ada");
    f.users.insert(42_i64, ada.clone());

    let mut contact = ContactInfo::new(1, 42, "email", "ada@example.com");
    f.resolver.resolve(&mut contact).await.unwrap();

    assert_eq!(contact.user, RelationField::Resolved(Some(ada)));
    assert_eq!(f.users.calls(), vec![("id".to_string(), DbValue::I64(42))]);
}

#[tokio::test]
async fn test_belongs_to_with_null_key_or_missing_target() {
    let f = fixture();

    let mut orphan = ContactInfo::new(1, 0, "email", "nobody@example.com");
    orphan.user_id = None;
    f.resolver.resolve(&mut orphan).await.unwrap();
    assert_eq!(orphan.user, RelationField::Resolved(None));
    assert_eq!(f.users.call_count(), 0);

    let mut dangling = ContactInfo::new(2, 99, "email", "ghost@example.com");
    f.resolver.resolve(&mut dangling).await.unwrap();
    assert_eq!(dangling.user, RelationField::Resolved(None));
    assert_eq!(f.users.call_count(), 1);
}

#[tokio::test]
async fn test_belongs_to_keeps_first_of_several_matches() {
    let f = fixture();
    f.users.insert(42_i64, User::new(Some(42), "first"));
    f.users.insert(42_i64, User::new(Some(42), "second"));

    let mut contact = ContactInfo::new(1, 42, "email", "ada@example.com");
    f.resolver.resolve(&mut contact).await.unwrap();

    let owner = contact.user.get().cloned().flatten().unwrap();
    assert_eq!(owner.name, "first");
}

#[tokio::test]
async fn test_entities_without_relationships_are_untouched() {
    let f = fixture();
    let mut addr = address(1, 42, 0.0, 0.0);
    f.resolver.resolve(&mut addr).await.unwrap();
    assert_eq!(addr, address(1, 42, 0.0, 0.0));
}

#[tokio::test]
async fn test_batch_resolution_assigns_each_owner_its_rows() {
    let config = Config {
        max_concurrent_fetches: 2,
        ..Config::default()
    };
    let f = fixture_with(MockRepo::new().with_jitter(3), MockRepo::new(), &config);
    for id in 1..=5_i64 {
        for n in 0..id {
            f.contacts
                .insert(id, ContactInfo::new(id * 100 + n, id, "email", &format!("u{id}-{n}")));
        }
    }

    let mut users: Vec<User> = (1..=5).map(|id| User::new(Some(id), "u")).collect();
    users.push(User::new(None, "unsaved"));
    f.resolver.resolve_batch(&mut users).await.unwrap();

    for user in &users[..5] {
        let id = user.id().unwrap();
        let details: Vec<_> = user.contacts.items().iter().map(|c| c.detail.clone()).collect();
        let expected: Vec<_> = (0..id).map(|n| format!("u{id}-{n}")).collect();
        assert_eq!(details, expected);
        assert!(user.addresses.is_resolved());
    }
    assert_eq!(users[5].contacts, RelationField::Resolved(Vec::new()));
    // five owners with an id, two relationships each
    assert_eq!(f.contacts.call_count() + f.addresses.call_count(), 10);
}

#[tokio::test]
async fn test_batch_resolution_reports_first_failure() {
    let f = fixture();
    f.contacts.insert(1_i64, ContactInfo::new(1, 1, "email", "a@example.com"));
    f.addresses.set_failing(true);

    let mut users = vec![User::new(Some(1), "a"), User::new(Some(2), "b")];
    let err = f.resolver.resolve_batch(&mut users).await.unwrap_err();

    assert!(matches!(
        err,
        MappingError::RelationshipResolution { field: "addresses", .. }
    ));
    assert_eq!(users[0].contacts.items().len(), 1);
    assert!(users[1].contacts.is_resolved());
    assert!(!users[0].addresses.is_resolved());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolution_never_mixes_fields() {
    const USERS: i64 = 1000;

    let f = fixture_with(
        MockRepo::new().with_jitter(3),
        MockRepo::new().with_jitter(3),
        &Config::default(),
    );
    for id in 1..=USERS {
        f.contacts
            .insert(id, ContactInfo::new(id, id, "email", &format!("user{id}@example.com")));
        f.contacts
            .insert(id, ContactInfo::new(USERS + id, id, "phone", &format!("+1-555-{id:04}")));
        f.addresses.insert(id, address(id, id, id as f64, -(id as f64)));
    }

    let handles: Vec<_> = (1..=USERS)
        .map(|id| {
            let resolver = f.resolver.clone();
            tokio::spawn(async move {
                let mut user = User::new(Some(id), "concurrent");
                resolver.resolve(&mut user).await.map(|()| user)
            })
        })
        .collect();

    for handle in handles {
        let user = handle.await.unwrap().unwrap();
        let id = user.id().unwrap();

        let contacts = user.contacts.items();
        assert_eq!(contacts.len(), 2, "user {id}");
        assert!(contacts.iter().all(|c| c.user_id == Some(id)));
        assert_eq!(contacts[0].kind, "email");
        assert_eq!(contacts[1].kind, "phone");

        assert_eq!(user.addresses.items(), &[address(id, id, id as f64, -(id as f64))]);
    }
    assert_eq!(f.contacts.call_count(), USERS as usize);
    assert_eq!(f.addresses.call_count(), USERS as usize);
}
