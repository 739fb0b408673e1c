//! In-memory protocol doubles.
//!
//! Every double records what the adapter asked of it so tests can assert on
//! sends, nudges, recalls, mutes and request handling without a network.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::config::{MiraiBotConfiguration, PasswordKind};

/// Id of the bot's own member entry in every [`TestGroup`].
pub const TEST_BOT_ID: i64 = 10_000;

/// Id of the owner in every [`TestGroup`].
pub const TEST_OWNER_ID: i64 = 1;

static MESSAGE_SEQ: AtomicI32 = AtomicI32::new(1);

fn next_source(from_id: i64, target_id: i64, kind: MessageSourceKind, chain: &NativeMessageChain) -> NativeMessageSource {
    let seq = MESSAGE_SEQ.fetch_add(1, Ordering::SeqCst);
    NativeMessageSource {
        ids: vec![seq],
        internal_ids: vec![seq + 10_000],
        time: 1_700_000_000 + seq,
        from_id,
        target_id,
        kind,
        original_message: chain.elements.clone(),
    }
}

/// Builds an inbound chain with a fresh source.
pub fn inbound(elements: Vec<NativeMessage>, from_id: i64, target_id: i64, kind: MessageSourceKind) -> NativeMessageChain {
    let chain = NativeMessageChain::new(elements);
    let source = next_source(from_id, target_id, kind, &chain);
    chain.with_source(source)
}

fn uploaded(name: &str, data: &[u8]) -> NativeImage {
    let mut image = NativeImage::from_id(format!("{{{name}}}.png"));
    image.size = data.len() as i64;
    image
}

/// What a double recorded.
#[derive(Default)]
pub struct Record {
    /// Chains sent to the contact.
    pub sent: Mutex<Vec<NativeMessageChain>>,
    /// Subjects of nudges aimed at the contact.
    pub nudged_in: Mutex<Vec<i64>>,
    /// Names of uploaded images.
    pub uploads: Mutex<Vec<String>>,
}

impl Record {
    fn send(&self, chain: &NativeMessageChain) {
        self.sent.lock().push(chain.clone());
    }

    /// Elements of every sent chain, in order.
    pub fn sent_elements(&self) -> Vec<Vec<NativeMessage>> {
        self.sent.lock().iter().map(|c| c.elements.clone()).collect()
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// A receipt that records recalls.
pub struct TestReceipt {
    source: NativeMessageSource,
    target: NativeContact,
    /// Set once recalled.
    pub recalled: AtomicBool,
}

impl TestReceipt {
    fn new(target: NativeContact, kind: MessageSourceKind, chain: &NativeMessageChain) -> Arc<Self> {
        let source = next_source(TEST_BOT_ID, target.id(), kind, chain);
        Arc::new(Self {
            source,
            target,
            recalled: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl NativeReceipt for TestReceipt {
    fn source(&self) -> &NativeMessageSource {
        &self.source
    }

    fn target(&self) -> NativeContact {
        self.target.clone()
    }

    async fn recall(&self) -> NativeResult<()> {
        self.recalled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Friend and stranger
// =============================================================================

/// A friend double.
pub struct TestFriend {
    id: i64,
    nick: String,
    remark: RwLock<String>,
    /// Set once deleted.
    pub deleted: AtomicBool,
    /// Recorded interactions.
    pub record: Record,
}

impl TestFriend {
    /// Creates a friend without a remark.
    pub fn new(id: i64, nick: &str) -> Arc<Self> {
        Arc::new(Self {
            id,
            nick: nick.into(),
            remark: RwLock::new(String::new()),
            deleted: AtomicBool::new(false),
            record: Record::default(),
        })
    }
}

#[async_trait]
impl NativeFriend for TestFriend {
    fn id(&self) -> i64 {
        self.id
    }

    fn nick(&self) -> String {
        self.nick.clone()
    }

    fn avatar_url(&self) -> String {
        format!("https://q.qlogo.cn/g?b=qq&nk={}&s=640", self.id)
    }

    fn remark(&self) -> String {
        self.remark.read().clone()
    }

    async fn set_remark(&self, remark: &str) -> NativeResult<()> {
        *self.remark.write() = remark.into();
        Ok(())
    }

    async fn delete(&self) -> NativeResult<()> {
        self.deleted.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_message(&self, chain: &NativeMessageChain) -> NativeResult<Arc<dyn NativeReceipt>> {
        self.record.send(chain);
        let me: Arc<dyn NativeFriend> = TestFriend::new(self.id, &self.nick);
        Ok(TestReceipt::new(NativeContact::Friend(me), MessageSourceKind::Friend, chain))
    }

    async fn upload_image(&self, name: &str, data: &[u8]) -> NativeResult<NativeImage> {
        self.record.uploads.lock().push(name.into());
        Ok(uploaded(name, data))
    }

    async fn nudge(&self, to: &NativeContact) -> NativeResult<bool> {
        self.record.nudged_in.lock().push(to.id());
        Ok(true)
    }
}

/// A stranger double.
pub struct TestStranger {
    id: i64,
    nick: String,
    /// Recorded interactions.
    pub record: Record,
}

impl TestStranger {
    /// Creates a stranger.
    pub fn new(id: i64, nick: &str) -> Arc<Self> {
        Arc::new(Self {
            id,
            nick: nick.into(),
            record: Record::default(),
        })
    }
}

#[async_trait]
impl NativeStranger for TestStranger {
    fn id(&self) -> i64 {
        self.id
    }

    fn nick(&self) -> String {
        self.nick.clone()
    }

    fn avatar_url(&self) -> String {
        String::new()
    }

    async fn send_message(&self, chain: &NativeMessageChain) -> NativeResult<Arc<dyn NativeReceipt>> {
        self.record.send(chain);
        let me: Arc<dyn NativeStranger> = TestStranger::new(self.id, &self.nick);
        Ok(TestReceipt::new(NativeContact::Stranger(me), MessageSourceKind::Stranger, chain))
    }

    async fn upload_image(&self, name: &str, data: &[u8]) -> NativeResult<NativeImage> {
        self.record.uploads.lock().push(name.into());
        Ok(uploaded(name, data))
    }

    async fn nudge(&self, to: &NativeContact) -> NativeResult<bool> {
        self.record.nudged_in.lock().push(to.id());
        Ok(true)
    }
}

// =============================================================================
// Group and member
// =============================================================================

/// A member double.
pub struct TestMember {
    id: i64,
    group_id: i64,
    card: String,
    nick: String,
    permission: NativePermission,
    normal: bool,
    mute_remaining: AtomicI32,
    /// Kick message once kicked.
    pub kicked: Mutex<Option<(String, bool)>>,
    /// Recorded interactions.
    pub record: Record,
}

impl TestMember {
    /// Creates a normal member.
    pub fn new(id: i64, group_id: i64, card: &str, permission: NativePermission) -> Arc<Self> {
        Self::build(id, group_id, card, permission, true)
    }

    /// Creates an anonymous member.
    pub fn anonymous(id: i64, group_id: i64) -> Arc<Self> {
        Self::build(id, group_id, "匿名", NativePermission::Member, false)
    }

    fn build(id: i64, group_id: i64, card: &str, permission: NativePermission, normal: bool) -> Arc<Self> {
        Arc::new(Self {
            id,
            group_id,
            card: card.into(),
            nick: format!("nick-{id}"),
            permission,
            normal,
            mute_remaining: AtomicI32::new(0),
            kicked: Mutex::new(None),
            record: Record::default(),
        })
    }
}

#[async_trait]
impl NativeMember for TestMember {
    fn id(&self) -> i64 {
        self.id
    }

    fn group_id(&self) -> i64 {
        self.group_id
    }

    fn name_card(&self) -> String {
        self.card.clone()
    }

    fn nick(&self) -> String {
        self.nick.clone()
    }

    fn special_title(&self) -> String {
        String::new()
    }

    fn permission(&self) -> NativePermission {
        self.permission
    }

    fn avatar_url(&self) -> String {
        String::new()
    }

    fn mute_time_remaining(&self) -> i32 {
        self.mute_remaining.load(Ordering::SeqCst)
    }

    async fn mute(&self, seconds: i32) -> NativeResult<()> {
        self.mute_remaining.store(seconds, Ordering::SeqCst);
        Ok(())
    }

    async fn unmute(&self) -> NativeResult<()> {
        self.mute_remaining.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn kick(&self, message: &str, block: bool) -> NativeResult<()> {
        *self.kicked.lock() = Some((message.into(), block));
        Ok(())
    }

    async fn send_message(&self, chain: &NativeMessageChain) -> NativeResult<Arc<dyn NativeReceipt>> {
        self.record.send(chain);
        let me: Arc<dyn NativeMember> =
            TestMember::build(self.id, self.group_id, &self.card, self.permission, self.normal);
        Ok(TestReceipt::new(NativeContact::Member(me), MessageSourceKind::Temp, chain))
    }

    async fn upload_image(&self, name: &str, data: &[u8]) -> NativeResult<NativeImage> {
        self.record.uploads.lock().push(name.into());
        Ok(uploaded(name, data))
    }

    async fn nudge(&self, to: &NativeContact) -> NativeResult<bool> {
        self.record.nudged_in.lock().push(to.id());
        Ok(true)
    }

    fn is_normal(&self) -> bool {
        self.normal
    }
}

/// Announcements of a [`TestGroup`].
pub struct TestAnnouncements {
    group_id: i64,
    items: RwLock<Vec<NativeOnlineAnnouncement>>,
    /// Fids that were reminded.
    pub reminded: Mutex<Vec<String>>,
}

#[async_trait]
impl NativeAnnouncements for TestAnnouncements {
    async fn list(&self) -> NativeResult<Vec<NativeOnlineAnnouncement>> {
        Ok(self.items.read().clone())
    }

    async fn get(&self, fid: &str) -> NativeResult<Option<NativeOnlineAnnouncement>> {
        Ok(self.items.read().iter().find(|a| a.fid == fid).cloned())
    }

    async fn publish(
        &self,
        content: &str,
        parameters: &AnnouncementParameters,
    ) -> NativeResult<NativeOnlineAnnouncement> {
        let mut items = self.items.write();
        let announcement = NativeOnlineAnnouncement {
            fid: format!("fid-{}", items.len() + 1),
            group_id: self.group_id,
            sender_id: TEST_BOT_ID,
            content: content.into(),
            parameters: parameters.clone(),
            all_confirmed: false,
            confirmed_members_count: 0,
            publication_time: 1_700_000_000,
        };
        items.push(announcement.clone());
        Ok(announcement)
    }

    async fn delete(&self, fid: &str) -> NativeResult<bool> {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|a| a.fid != fid);
        Ok(items.len() != before)
    }

    async fn members(&self, _fid: &str, _confirmed: bool) -> NativeResult<Vec<Arc<dyn NativeMember>>> {
        Ok(Vec::new())
    }

    async fn remind(&self, fid: &str) -> NativeResult<()> {
        self.reminded.lock().push(fid.into());
        Ok(())
    }
}

/// A group double with an owner and the bot as administrator.
pub struct TestGroup {
    id: i64,
    name: String,
    mute_all: AtomicBool,
    mute_ack_delay: Mutex<Duration>,
    members: RwLock<Vec<Arc<TestMember>>>,
    announcements: Arc<TestAnnouncements>,
    /// Set once the bot quit.
    pub quit: AtomicBool,
    /// Recorded interactions.
    pub record: Record,
}

impl TestGroup {
    /// Creates a group.
    pub fn new(id: i64, name: &str) -> Arc<Self> {
        let members = vec![
            TestMember::new(TEST_OWNER_ID, id, "owner", NativePermission::Owner),
            TestMember::new(TEST_BOT_ID, id, "bot", NativePermission::Administrator),
        ];
        Arc::new(Self {
            id,
            name: name.into(),
            mute_all: AtomicBool::new(false),
            mute_ack_delay: Mutex::new(Duration::ZERO),
            members: RwLock::new(members),
            announcements: Arc::new(TestAnnouncements {
                group_id: id,
                items: RwLock::new(Vec::new()),
                reminded: Mutex::new(Vec::new()),
            }),
            quit: AtomicBool::new(false),
            record: Record::default(),
        })
    }

    /// Makes `set_mute_all` return only `delay` after the switch is applied.
    pub fn delay_mute_ack(&self, delay: Duration) {
        *self.mute_ack_delay.lock() = delay;
    }

    /// Adds a member.
    pub fn add_member(&self, member: Arc<TestMember>) {
        self.members.write().push(member);
    }

    /// Finds a member double.
    pub fn test_member(&self, id: i64) -> Option<Arc<TestMember>> {
        self.members.read().iter().find(|m| m.id == id).cloned()
    }

    fn member_or_first(&self, id: i64) -> Arc<dyn NativeMember> {
        let members = self.members.read();
        let found = members
            .iter()
            .find(|m| m.id == id)
            .or_else(|| members.first())
            .cloned();
        match found {
            Some(member) => member,
            None => TestMember::new(id, self.id, "", NativePermission::Member),
        }
    }
}

#[async_trait]
impl NativeGroup for TestGroup {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn avatar_url(&self) -> String {
        format!("https://p.qlogo.cn/gh/{0}/{0}/640", self.id)
    }

    fn owner(&self) -> Arc<dyn NativeMember> {
        self.member_or_first(TEST_OWNER_ID)
    }

    fn bot_as_member(&self) -> Arc<dyn NativeMember> {
        self.member_or_first(TEST_BOT_ID)
    }

    fn members(&self) -> Vec<Arc<dyn NativeMember>> {
        self.members
            .read()
            .iter()
            .filter(|m| m.id != TEST_BOT_ID)
            .map(|m| m.clone() as Arc<dyn NativeMember>)
            .collect()
    }

    fn get_member(&self, id: i64) -> Option<Arc<dyn NativeMember>> {
        self.test_member(id).map(|m| m as Arc<dyn NativeMember>)
    }

    fn is_mute_all(&self) -> bool {
        self.mute_all.load(Ordering::SeqCst)
    }

    async fn set_mute_all(&self, mute: bool) -> NativeResult<()> {
        self.mute_all.store(mute, Ordering::SeqCst);
        let delay = *self.mute_ack_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn bot_mute_remaining(&self) -> i32 {
        0
    }

    fn bot_permission(&self) -> NativePermission {
        NativePermission::Administrator
    }

    async fn send_message(&self, chain: &NativeMessageChain) -> NativeResult<Arc<dyn NativeReceipt>> {
        self.record.send(chain);
        let me: Arc<dyn NativeGroup> = TestGroup::new(self.id, &self.name);
        Ok(TestReceipt::new(NativeContact::Group(me), MessageSourceKind::Group, chain))
    }

    async fn upload_image(&self, name: &str, data: &[u8]) -> NativeResult<NativeImage> {
        self.record.uploads.lock().push(name.into());
        Ok(uploaded(name, data))
    }

    fn announcements(&self) -> Arc<dyn NativeAnnouncements> {
        self.announcements.clone()
    }

    async fn quit(&self) -> NativeResult<bool> {
        Ok(!self.quit.swap(true, Ordering::SeqCst))
    }
}

// =============================================================================
// Bot
// =============================================================================

/// A bot double backed by a broadcast channel.
pub struct TestBot {
    id: i64,
    nick: String,
    online: AtomicBool,
    login_error: Mutex<Option<String>>,
    events: broadcast::Sender<NativeEvent>,
    closed: CancellationToken,
    self_friend: Arc<TestFriend>,
    friends: RwLock<Vec<Arc<TestFriend>>>,
    groups: RwLock<Vec<Arc<TestGroup>>>,
    strangers: RwLock<Vec<Arc<TestStranger>>>,
    /// Number of successful logins.
    pub logins: AtomicI32,
    /// Subjects of nudges aimed at the bot itself.
    pub nudged_in: Mutex<Vec<i64>>,
    /// Recalled sources.
    pub recalled: Mutex<Vec<NativeMessageSource>>,
    /// Handled requests: event id, accepted, reject message, blacklist.
    pub requests: Mutex<Vec<(i64, bool, Option<String>, bool)>>,
    profiles: Mutex<HashMap<i64, NativeUserProfile>>,
}

impl TestBot {
    /// Creates an offline bot.
    pub fn new(id: i64) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            id,
            nick: format!("bot-{id}"),
            online: AtomicBool::new(false),
            login_error: Mutex::new(None),
            events,
            closed: CancellationToken::new(),
            self_friend: TestFriend::new(id, &format!("bot-{id}")),
            friends: RwLock::new(Vec::new()),
            groups: RwLock::new(Vec::new()),
            strangers: RwLock::new(Vec::new()),
            logins: AtomicI32::new(0),
            nudged_in: Mutex::new(Vec::new()),
            recalled: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            profiles: Mutex::new(HashMap::new()),
        })
    }

    /// Makes the next login fail.
    pub fn fail_login(&self, reason: &str) {
        *self.login_error.lock() = Some(reason.into());
    }

    /// Adds a friend.
    pub fn add_friend(&self, friend: Arc<TestFriend>) {
        self.friends.write().push(friend);
    }

    /// Adds a group.
    pub fn add_group(&self, group: Arc<TestGroup>) {
        self.groups.write().push(group);
    }

    /// Adds a stranger.
    pub fn add_stranger(&self, stranger: Arc<TestStranger>) {
        self.strangers.write().push(stranger);
    }

    /// Sets the profile returned for `user_id`.
    pub fn set_profile(&self, user_id: i64, profile: NativeUserProfile) {
        self.profiles.lock().insert(user_id, profile);
    }

    /// Broadcasts an event. Returns the number of subscribers reached.
    pub fn emit(&self, event: NativeEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }
}

#[async_trait]
impl NativeBot for TestBot {
    fn id(&self) -> i64 {
        self.id
    }

    fn nick(&self) -> String {
        self.nick.clone()
    }

    fn avatar_url(&self) -> String {
        format!("https://q.qlogo.cn/g?b=qq&nk={}&s=640", self.id)
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    async fn login(&self) -> NativeResult<()> {
        if let Some(reason) = self.login_error.lock().take() {
            return Err(NativeError::Login(reason));
        }
        self.logins.fetch_add(1, Ordering::SeqCst);
        self.online.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) {
        self.online.store(false, Ordering::SeqCst);
        self.closed.cancel();
    }

    async fn join(&self) {
        self.closed.cancelled().await;
    }

    fn subscribe(&self) -> broadcast::Receiver<NativeEvent> {
        self.events.subscribe()
    }

    fn friends(&self) -> Vec<Arc<dyn NativeFriend>> {
        self.friends.read().iter().map(|f| f.clone() as Arc<dyn NativeFriend>).collect()
    }

    fn get_friend(&self, id: i64) -> Option<Arc<dyn NativeFriend>> {
        self.friends
            .read()
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.clone() as Arc<dyn NativeFriend>)
    }

    fn groups(&self) -> Vec<Arc<dyn NativeGroup>> {
        self.groups.read().iter().map(|g| g.clone() as Arc<dyn NativeGroup>).collect()
    }

    fn get_group(&self, id: i64) -> Option<Arc<dyn NativeGroup>> {
        self.groups
            .read()
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.clone() as Arc<dyn NativeGroup>)
    }

    fn strangers(&self) -> Vec<Arc<dyn NativeStranger>> {
        self.strangers.read().iter().map(|s| s.clone() as Arc<dyn NativeStranger>).collect()
    }

    fn get_stranger(&self, id: i64) -> Option<Arc<dyn NativeStranger>> {
        self.strangers
            .read()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.clone() as Arc<dyn NativeStranger>)
    }

    fn as_friend(&self) -> Arc<dyn NativeFriend> {
        self.self_friend.clone()
    }

    async fn nudge(&self, to: &NativeContact) -> NativeResult<bool> {
        self.nudged_in.lock().push(to.id());
        Ok(true)
    }

    async fn recall(&self, source: &NativeMessageSource) -> NativeResult<()> {
        self.recalled.lock().push(source.clone());
        Ok(())
    }

    async fn accept_request(&self, request: &NativeRequest) -> NativeResult<()> {
        self.requests.lock().push((request.event_id(), true, None, false));
        Ok(())
    }

    async fn reject_request(
        &self,
        request: &NativeRequest,
        message: Option<&str>,
        blacklist: bool,
    ) -> NativeResult<()> {
        self.requests
            .lock()
            .push((request.event_id(), false, message.map(str::to_string), blacklist));
        Ok(())
    }

    async fn query_profile(&self, user_id: i64) -> NativeResult<NativeUserProfile> {
        self.profiles
            .lock()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| NativeError::other(format!("no profile for {user_id}")))
    }
}

// =============================================================================
// Factory
// =============================================================================

/// A factory handing out [`TestBot`]s.
#[derive(Default)]
pub struct TestFactory {
    /// Bots created so far, with the password they were created with.
    pub created: Mutex<Vec<(Arc<TestBot>, PasswordKind, MiraiBotConfiguration)>>,
}

impl TestFactory {
    /// Creates a factory.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The most recently created bot.
    pub fn last(&self) -> Option<Arc<TestBot>> {
        self.created.lock().last().map(|(bot, _, _)| bot.clone())
    }
}

impl NativeBotFactory for TestFactory {
    fn new_bot(
        &self,
        code: i64,
        password: PasswordKind,
        configuration: &MiraiBotConfiguration,
    ) -> NativeResult<Arc<dyn NativeBot>> {
        let bot = TestBot::new(code);
        self.created
            .lock()
            .push((bot.clone(), password, configuration.clone()));
        Ok(bot)
    }
}
