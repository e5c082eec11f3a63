//! Public invitation view and the share texts sent to guests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Guest, RsvpResponse, WeddingConfig};

/// Time left until the ceremony.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub finished: bool,
}

impl Countdown {
    /// Countdown from `now` to `target`; all zero once the target has passed.
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let left = (target - now).num_seconds();
        if left <= 0 {
            return Countdown {
                finished: true,
                ..Default::default()
            };
        }

        Countdown {
            days: left / 86_400,
            hours: (left / 3_600) % 24,
            minutes: (left / 60) % 60,
            seconds: left % 60,
            finished: false,
        }
    }
}

/// Everything the invitation page needs for one guest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationView {
    pub guest: Guest,
    pub prefilled_name: String,
    pub show_gift: bool,
    pub config: WeddingConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<Countdown>,
    pub wishes: Vec<RsvpResponse>,
}

impl InvitationView {
    pub fn new(
        guest: Guest,
        mut config: WeddingConfig,
        wishes: Vec<RsvpResponse>,
        now: DateTime<Utc>,
    ) -> Self {
        let show_gift = !guest.is_family;
        if !show_gift {
            config.gift_accounts.clear();
        }

        let countdown = match config.wedding_instant() {
            Ok(target) => Some(Countdown::until(target, now)),
            Err(e) => {
                tracing::warn!("Skipping countdown: {}", e);
                None
            }
        };

        Self {
            prefilled_name: guest.prefilled_name(),
            guest,
            show_gift,
            config,
            countdown,
            wishes,
        }
    }
}

/// Language of the prewritten invitation message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareLanguage {
    #[default]
    Id,
    En,
}

/// Query string of the share endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareQuery {
    #[serde(default)]
    pub lang: ShareLanguage,
}

/// Link and message the admin copies to send an invitation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareMessage {
    pub slug: String,
    pub link: String,
    pub language: ShareLanguage,
    pub message: String,
}

/// Personal invite link for a slug.
pub fn invite_link(base_url: &str, slug: &str) -> String {
    format!(
        "{}/invite/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(slug)
    )
}

/// Fill the invitation message template for one guest.
pub fn invitation_message(
    language: ShareLanguage,
    guest_name: &str,
    config: &WeddingConfig,
    link: &str,
) -> String {
    let bride = config.bride_formal_name();
    let groom = config.groom_formal_name();

    match language {
        ShareLanguage::Id => format!(
            "Assalamu'alaikum Warahmatullahi Wabarakatuh\n\
             \n\
             Yth. {guest} yang dirahmati Allah SWT,\n\
             \n\
             Maha Suci Allah SWT dengan segala Kebesaran-Nya yang telah menciptakan makhluk-Nya \
             berpasang-pasangan dan mempersatukan dua insan dalam ikatan suci pernikahan. Dengan \
             penuh rasa syukur serta tanpa mengurangi rasa hormat, izinkan kami menyampaikan kabar \
             bahagia ini.\n\
             \n\
             Alhamdulillah, insyaAllah pada:\n\
             \n\
             📅 Hari/Tanggal: {date}\n\
             🕌 Acara: Walimatul 'Ursy (Resepsi Pernikahan)\n\
             \n\
             Kami,\n\
             {bride}\n\
             &\n\
             {groom}\n\
             \n\
             bermaksud mengundang {guest} untuk hadir serta memberikan doa restu pada hari bahagia \
             kami tersebut. Kehadiran dan doa dari keluarga besar kami ini sangat berarti, sebagai \
             pelengkap kebahagiaan dan harapan untuk membangun keluarga yang sakinah, mawaddah, \
             warahmah.\n\
             \n\
             Berikut link undangan lengkap yang dapat diakses untuk informasi detail waktu dan \
             lokasi acara:\n\
             \n\
             🔗 Undangan:\n\
             {link}\n\
             \n\
             Dengan tulus kami memohon maaf apabila undangan ini hanya dapat kami sampaikan melalui \
             pesan ini. Semoga silaturahmi kita senantiasa terjaga dan Allah SWT membalas segala \
             kebaikanmu dengan limpahan keberkahan.\n\
             \n\
             Terima kasih atas perhatian, doa, dan waktu yang diberikan.\n\
             \n\
             Wassalamu'alaikum Warahmatullahi Wabarakatuh\n\
             \n\
             Hormat kami,\n\
             {bride_short} & {groom_short}",
            guest = guest_name,
            date = config.display_date,
            bride = bride,
            groom = groom,
            link = link,
            bride_short = config.bride_name,
            groom_short = config.groom_name,
        ),
        ShareLanguage::En => format!(
            "Dear {guest},\n\
             \n\
             With gratitude and joy, we would like to share our happy news.\n\
             \n\
             📅 Date: {date}\n\
             💍 Event: Wedding Reception\n\
             \n\
             We,\n\
             {bride}\n\
             &\n\
             {groom}\n\
             \n\
             would be honoured to have you with us and to receive your blessings on our special \
             day.\n\
             \n\
             The full invitation, with the schedule and the venue, is here:\n\
             \n\
             🔗 Invitation:\n\
             {link}\n\
             \n\
             Please forgive us for sending this invitation by message. Thank you for your time, \
             your prayers and your kindness.\n\
             \n\
             Warm regards,\n\
             {bride_short} & {groom_short}",
            guest = guest_name,
            date = config.display_date,
            bride = bride,
            groom = groom,
            link = link,
            bride_short = config.bride_name,
            groom_short = config.groom_name,
        ),
    }
}
