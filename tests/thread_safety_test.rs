use anyhow::Result;
use serde_json::json;
use std::thread;
use wrap_model::{
    AnyProperty, Bool, Float, Int, JsonMap, Model, Property, Str, Submodel, WrapModel,
};

static FIRST_NAME: Property<Str> = Property::new("first_name", Str::new());
static LAST_NAME: Property<Str> = Property::new("last_name", Str::new());
static EMAIL: Property<Str> = Property::new("email", Str::new());
static AGE: Property<Int> = Property::new("age", Int::new());
static SCORE: Property<Float> = Property::new("score", Float::new());
static IS_ACTIVE: Property<Bool> = Property::new("is_active", Bool::new());
static CITY: Property<Str> = Property::new("address.city", Str::new());
static STREET: Property<Str> = Property::new("address.street", Str::new());
static LATITUDE: Property<Float> = Property::new("address.coordinates.latitude", Float::new());
static LONGITUDE: Property<Float> = Property::new("address.coordinates.longitude", Float::new());
static TAGLINE: Property<Str> = Property::new("profile.tagline", Str::new());
static FOLLOWERS: Property<Int> = Property::new("profile.stats.followers", Int::new());

#[derive(Clone)]
struct StressModel(WrapModel);

impl Model for StressModel {
    fn properties() -> Vec<&'static dyn AnyProperty> {
        vec![
            &FOLLOWERS, &LATITUDE, &LONGITUDE, &TAGLINE, &CITY, &STREET, &FIRST_NAME, &LAST_NAME,
            &EMAIL, &AGE, &SCORE, &IS_ACTIVE,
        ]
    }

    fn from_wrap(wrap: WrapModel) -> Self {
        StressModel(wrap)
    }

    fn wrap(&self) -> &WrapModel {
        &self.0
    }
}

static BIO: Property<Str> = Property::new("bio", Str::new());

#[derive(Clone)]
struct Profile(WrapModel);

impl Model for Profile {
    fn properties() -> Vec<&'static dyn AnyProperty> {
        vec![&BIO]
    }

    fn from_wrap(wrap: WrapModel) -> Self {
        Profile(wrap)
    }

    fn wrap(&self) -> &WrapModel {
        &self.0
    }
}

static PROFILE: Property<Submodel<Profile>> = Property::new("profile", Submodel::new());

#[derive(Clone)]
struct Account(WrapModel);

impl Model for Account {
    fn properties() -> Vec<&'static dyn AnyProperty> {
        vec![&PROFILE]
    }

    fn from_wrap(wrap: WrapModel) -> Self {
        Account(wrap)
    }

    fn wrap(&self) -> &WrapModel {
        &self.0
    }
}

const ITERATIONS: usize = 200;
const THREADS: usize = 8;

fn sample_data() -> JsonMap {
    json!({
        "first_name": "John",
        "last_name": "Appleseed",
        "email": "john@apple.com",
        "age": 69,
        "score": 9001.0,
        "is_active": true,
        "address": {
            "city": "Cupertino",
            "street": "1 Apple Park Way",
            "coordinates": {"latitude": 37.3349, "longitude": -122.009}
        },
        "profile": {
            "tagline": "Think different",
            "stats": {"followers": 1000000000}
        }
    })
    .as_object()
    .cloned()
    .unwrap_or_default()
}

#[test]
fn test_concurrent_export_matches_serial_export() -> Result<()> {
    let expected = StressModel::with_data(sample_data(), false)
        .wrap()
        .current_model_data(false, true);

    for _ in 0..ITERATIONS {
        let model = StressModel::with_data(sample_data(), false);
        thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| s.spawn(|| model.wrap().current_model_data(false, true)))
                .collect();
            for handle in handles {
                let exported = handle.join().expect("export thread panicked");
                assert_eq!(exported, expected);
            }
        });
    }
    Ok(())
}

#[test]
fn test_concurrent_equality() {
    for _ in 0..ITERATIONS {
        let first = StressModel::with_data(sample_data(), false);
        let second = StressModel::with_data(sample_data(), false);
        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| assert!(first.is_equal_to_model(&second)));
            }
        });
    }
}

#[test]
fn test_concurrent_copy() {
    for _ in 0..ITERATIONS {
        let model = StressModel::with_data(sample_data(), true);
        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    let copy = model.copy();
                    assert!(!copy.is_mutable());
                });
            }
        });
    }
}

#[test]
fn test_concurrent_mixed_operations() -> Result<()> {
    for _ in 0..ITERATIONS {
        let model = StressModel::with_data(sample_data(), true);
        let other = StressModel::with_data(sample_data(), false);
        thread::scope(|s| {
            for t in 0..THREADS {
                let model = &model;
                let other = &other;
                s.spawn(move || match t % 4 {
                    0 => {
                        model.wrap().current_model_data(false, true);
                    }
                    1 => {
                        let _ = model.is_equal_to_model(other);
                    }
                    2 => {
                        model.copy();
                    }
                    _ => {
                        let _ = model.wrap().set(&AGE, t as i64);
                        let _ = model.wrap().current_model_data_as_json(false);
                    }
                });
            }
        });
        assert_eq!(model.wrap().get(&FIRST_NAME), "John");
        assert_eq!(model.wrap().get(&FOLLOWERS), 1_000_000_000);
    }
    Ok(())
}

#[test]
fn test_shared_handles_see_writes() -> Result<()> {
    let model = StressModel::with_data(sample_data(), true);
    let handle = model.clone();
    let written = thread::scope(|s| {
        s.spawn(|| handle.wrap().set(&CITY, "Palo Alto".to_string()))
            .join()
    });
    assert!(matches!(written, Ok(Ok(()))));
    assert_eq!(model.wrap().get(&CITY), "Palo Alto");
    assert_eq!(
        model.wrap().current_model_data(false, true)["address"]["city"],
        json!("Palo Alto")
    );
    Ok(())
}

#[test]
fn test_concurrent_first_reads_share_one_child() -> Result<()> {
    let data: JsonMap = serde_json::from_value(json!({"profile": {"bio": "Think different"}}))?;
    for _ in 0..ITERATIONS {
        let account = Account::with_data(data.clone(), true);
        let children: Vec<Option<Profile>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| s.spawn(|| account.wrap().get(&PROFILE)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("read thread panicked"))
                .collect()
        });

        let first = children[0]
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("profile did not decode"))?;
        for child in &children {
            let child = child
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("profile did not decode"))?;
            assert!(child.wrap().same_instance(first.wrap()));
        }
        assert_eq!(first.wrap().get(&BIO), "Think different");
    }
    Ok(())
}
