mod proptest_distribution;

use crate::settings::Settings;

pub(super) fn settings_with_nbest(nbest: Option<i64>) -> Settings {
    let mut settings = Settings::default();
    settings.distribution.nbest = nbest;
    settings
}
